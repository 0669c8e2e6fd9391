//! Process-wide configuration backed by a flat `key value` file.
//!
//! The file is read once at startup and rewritten in full on every `CONFIG SET`. Keys are
//! case-insensitive; the value is everything after the first space.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error as ThisError;

pub const DEFAULT_PORT: u16 = 6555;
pub const DEFAULT_BIND: &str = "127.0.0.1";

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write config file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Clone, Default)]
pub struct Config {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// Where `CONFIG SET` writes to. `None` keeps the config in memory only.
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
    /// Values that apply to this process but are never written back, e.g. CLI flags.
    overrides: BTreeMap<String, String>,
}

impl Config {
    /// Reads the config file at `path`. A missing file yields an empty config that will be
    /// created on the first `CONFIG SET`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Config, ConfigError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let inner = Inner {
            path: Some(path),
            entries,
            overrides: BTreeMap::new(),
        };
        Ok(Config {
            inner: Arc::new(RwLock::new(inner)),
        })
    }

    /// An in-memory config seeded from `key value` text.
    pub fn from_text(text: &str) -> Config {
        let inner = Inner {
            entries: parse(text),
            ..Inner::default()
        };
        Config {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let key = key.to_lowercase();
        let inner = self.read();
        inner
            .overrides
            .get(&key)
            .or_else(|| inner.entries.get(&key))
            .cloned()
    }

    /// Stores `value` under `key` and rewrites the config file. An empty value removes the key.
    ///
    /// The new value only takes effect once the file has been written.
    pub fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let key = key.to_lowercase();
        let mut inner = self.write();

        let mut entries = inner.entries.clone();
        if value.is_empty() {
            entries.remove(&key);
        } else {
            entries.insert(key.clone(), value.to_string());
        }

        if let Some(path) = &inner.path {
            write(path, &entries)?;
        }

        inner.overrides.remove(&key);
        inner.entries = entries;
        Ok(())
    }

    /// Applies a value for this process only; it is not written to the config file.
    pub fn set_override(&self, key: &str, value: &str) {
        self.write()
            .overrides
            .insert(key.to_lowercase(), value.to_string());
    }

    pub fn port(&self) -> u16 {
        self.get("port")
            .and_then(|port| port.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn bind(&self) -> String {
        self.get("bind")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    /// Directory for the snapshot and append-only files.
    pub fn dir(&self) -> PathBuf {
        self.get("dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Append-only logging is on unless explicitly set to something other than `yes`.
    pub fn appendonly(&self) -> bool {
        self.get("appendonly").map_or(true, |value| is_yes(&value))
    }

    pub fn loadstart(&self) -> bool {
        self.get("loadstart").is_some_and(|value| is_yes(&value))
    }

    pub fn requirepass(&self) -> Option<String> {
        self.get("requirepass")
    }
}

pub fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

fn parse(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(' '))
        .map(|(key, value)| (key.to_lowercase(), value.trim().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

fn write(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    let mut text = String::new();
    for (key, value) in entries {
        text.push_str(key);
        text.push(' ');
        text.push_str(value);
        text.push('\n');
    }

    fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
