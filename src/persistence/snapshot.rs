//! Point-in-time JSON snapshot of the keyspace.
//!
//! Expiry deadlines are stored as absolute unix milliseconds so they keep counting down while
//! the server is stopped. Values are stored as UTF-8 text.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::PersistenceError;
use crate::store::Value;

const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEntry {
    key: String,
    value: SnapshotValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum SnapshotValue {
    String(String),
    List(Vec<String>),
    Set(Vec<String>),
    Hash(Vec<(String, String)>),
}

impl From<Value> for SnapshotValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(data) => SnapshotValue::String(text(&data)),
            Value::List(list) => SnapshotValue::List(list.iter().map(|v| text(v)).collect()),
            Value::Set(set) => {
                let mut members: Vec<String> = set.iter().map(|v| text(v)).collect();
                members.sort();
                SnapshotValue::Set(members)
            }
            Value::Hash(hash) => {
                let mut pairs: Vec<(String, String)> =
                    hash.iter().map(|(f, v)| (text(f), text(v))).collect();
                pairs.sort();
                SnapshotValue::Hash(pairs)
            }
        }
    }
}

impl From<SnapshotValue> for Value {
    fn from(value: SnapshotValue) -> Self {
        match value {
            SnapshotValue::String(data) => Value::String(Bytes::from(data)),
            SnapshotValue::List(list) => Value::List(list.into_iter().map(Bytes::from).collect()),
            SnapshotValue::Set(set) => Value::Set(set.into_iter().map(Bytes::from).collect()),
            SnapshotValue::Hash(hash) => Value::Hash(
                hash.into_iter()
                    .map(|(f, v)| (Bytes::from(f), Bytes::from(v)))
                    .collect(),
            ),
        }
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

/// Writes `entries` to `path` through a temporary file, so a crash mid-write never leaves a
/// truncated snapshot behind. Returns the number of keys written.
pub fn write(
    path: &Path,
    entries: Vec<(String, Value, Option<Duration>)>,
) -> Result<usize, PersistenceError> {
    let now = now_ms();
    let snapshot = Snapshot {
        version: VERSION,
        entries: entries
            .into_iter()
            .map(|(key, value, ttl)| SnapshotEntry {
                key,
                value: value.into(),
                expires_at_ms: ttl.map(|ttl| now + ttl.as_millis() as u64),
            })
            .collect(),
    };
    let count = snapshot.entries.len();

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
    fs::rename(&tmp, path)?;

    Ok(count)
}

/// Reads the snapshot at `path`, skipping keys whose deadline has already passed. A missing
/// snapshot reads as empty.
pub fn read(path: &Path) -> Result<Vec<(String, Value, Option<Duration>)>, PersistenceError> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let snapshot: Snapshot = serde_json::from_slice(&contents)?;

    let now = now_ms();
    let entries = snapshot
        .entries
        .into_iter()
        .filter_map(|entry| {
            let ttl = match entry.expires_at_ms {
                Some(deadline) if deadline <= now => return None,
                Some(deadline) => Some(Duration::from_millis(deadline - now)),
                None => None,
            };
            Some((entry.key, entry.value.into(), ttl))
        })
        .collect();

    Ok(entries)
}
