use bytes::{Bytes, BytesMut};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strum_macros::{AsRefStr, Display};
use thiserror::Error as ThisError;
use tokio::time::{Duration, Instant};

/// The Store is responsible for managing keys and their typed values, with optional time-to-live
/// settings for each key. Expired keys are removed lazily: the first operation that touches a key
/// past its deadline deletes it and behaves as if it never existed.
///
/// The store is designed to be thread-safe, allowing it to be shared and cloned cheaply using
/// reference counting. Every operation runs while holding the store lock, so a read-modify-write
/// such as INCR is never observed half-applied.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new() -> Store {
        Self::default()
    }
}

#[derive(Default)]
pub struct InnerStore {
    state: Mutex<State>,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        InnerStoreLocked { state }
    }
}

type Key = String;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Hash(_) => ValueKind::Hash,
        }
    }
}

/// The name reported by `TYPE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    String,
    List,
    Set,
    Hash,
}

pub struct Entry {
    pub value: Value,
    pub expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Entry {
        Entry {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Default)]
pub struct State {
    keys: HashMap<Key, Entry>,
}

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
}

/// Which end of a list an operation works on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum End {
    Front,
    Back,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist.
    Missing,
    /// The key exists and has no expiry.
    Persistent,
    Remaining(Duration),
}

impl<'a> InnerStoreLocked<'a> {
    /// Returns the live entry for `key`, deleting it first if its expiry has passed.
    fn entry(&mut self, key: &str) -> Option<&mut Entry> {
        let now = Instant::now();
        if self
            .state
            .keys
            .get(key)
            .is_some_and(|entry| entry.is_expired(now))
        {
            self.state.keys.remove(key);
            return None;
        }
        self.state.keys.get_mut(key)
    }

    fn entry_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> Value) -> &mut Entry {
        // Drop a stale entry so the default value starts without the old expiry.
        self.entry(key);
        self.state
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(default()))
    }

    fn string(&mut self, key: &str) -> Result<Option<&mut Bytes>, StoreError> {
        match self.entry(key).map(|entry| &mut entry.value) {
            None => Ok(None),
            Some(Value::String(data)) => Ok(Some(data)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    fn list(&mut self, key: &str) -> Result<Option<&mut VecDeque<Bytes>>, StoreError> {
        match self.entry(key).map(|entry| &mut entry.value) {
            None => Ok(None),
            Some(Value::List(list)) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    fn set_members(&mut self, key: &str) -> Result<Option<&mut HashSet<Bytes>>, StoreError> {
        match self.entry(key).map(|entry| &mut entry.value) {
            None => Ok(None),
            Some(Value::Set(set)) => Ok(Some(set)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    fn hash(&mut self, key: &str) -> Result<Option<&mut HashMap<Bytes, Bytes>>, StoreError> {
        match self.entry(key).map(|entry| &mut entry.value) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(Some(hash)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Deletes `key` when its collection has become empty.
    fn remove_if_empty(&mut self, key: &str) {
        let empty = match self.state.keys.get(key).map(|entry| &entry.value) {
            Some(Value::List(list)) => list.is_empty(),
            Some(Value::Set(set)) => set.is_empty(),
            Some(Value::Hash(hash)) => hash.is_empty(),
            _ => false,
        };
        if empty {
            self.state.keys.remove(key);
        }
    }

    /// Sets `key` to a string value, replacing any previous value and expiry.
    pub fn set(&mut self, key: String, data: Bytes) {
        self.state.keys.insert(key, Entry::new(Value::String(data)));
    }

    pub fn set_with_ttl(&mut self, key: Key, data: Bytes, ttl: Duration) {
        let entry = Entry {
            value: Value::String(data),
            expires_at: Some(Instant::now() + ttl),
        };
        self.state.keys.insert(key, entry);
    }

    /// Sets `key` only if it does not exist. Returns whether the value was written.
    pub fn set_nx(&mut self, key: String, data: Bytes) -> bool {
        if self.entry(&key).is_some() {
            return false;
        }
        self.set(key, data);
        true
    }

    pub fn get(&mut self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.string(key)?.map(|data| data.clone()))
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entry(key).is_some() && self.state.keys.remove(key).is_some()
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.entry(key).is_some()
    }

    pub fn kind(&mut self, key: &str) -> Option<ValueKind> {
        self.entry(key).map(|entry| entry.value.kind())
    }

    /// Number of keys that have not expired.
    pub fn size(&self) -> usize {
        let now = Instant::now();
        self.state
            .keys
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Number of live keys that carry an expiry.
    pub fn volatile_size(&self) -> usize {
        let now = Instant::now();
        self.state
            .keys
            .values()
            .filter(|entry| entry.expires_at.is_some() && !entry.is_expired(now))
            .count()
    }

    /// Adds `increment` to the integer stored at `key`. A missing key counts as zero. The expiry,
    /// if any, is kept.
    pub fn incr_by(&mut self, key: &str, increment: i64) -> Result<i64, StoreError> {
        let current = match self.string(key)? {
            Some(data) => std::str::from_utf8(data)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or(StoreError::NotAnInteger)?,
            None => 0,
        };

        let value = current
            .checked_add(increment)
            .ok_or(StoreError::Overflow)?;
        let data = Bytes::from(value.to_string());

        match self.string(key)? {
            Some(existing) => *existing = data,
            None => self.set(key.to_string(), data),
        }

        Ok(value)
    }

    /// Appends to the string at `key`, creating it if needed. Returns the new length.
    pub fn append(&mut self, key: &str, suffix: &[u8]) -> Result<usize, StoreError> {
        match self.string(key)? {
            Some(existing) => {
                let mut data = BytesMut::with_capacity(existing.len() + suffix.len());
                data.extend_from_slice(existing);
                data.extend_from_slice(suffix);
                *existing = data.freeze();
                Ok(existing.len())
            }
            None => {
                self.set(key.to_string(), Bytes::copy_from_slice(suffix));
                Ok(suffix.len())
            }
        }
    }

    pub fn strlen(&mut self, key: &str) -> Result<usize, StoreError> {
        Ok(self.string(key)?.map_or(0, |data| data.len()))
    }

    /// Installs or overwrites the expiry of `key`. Returns `false` if the key does not exist.
    pub fn expire(&mut self, key: &str, ttl: Duration) -> bool {
        match self.entry(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                true
            }
            None => false,
        }
    }

    pub fn ttl(&mut self, key: &str) -> Ttl {
        let now = Instant::now();
        match self.entry(key) {
            None => Ttl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => Ttl::Persistent,
            Some(Entry {
                expires_at: Some(expires_at),
                ..
            }) => Ttl::Remaining(expires_at.saturating_duration_since(now)),
        }
    }

    /// Pushes `values` one at a time onto the given end of the list at `key`. Returns the new
    /// length.
    pub fn push(&mut self, key: &str, values: Vec<Bytes>, end: End) -> Result<usize, StoreError> {
        let entry = self.entry_or_insert_with(key, || Value::List(VecDeque::new()));
        let list = match &mut entry.value {
            Value::List(list) => list,
            _ => return Err(StoreError::WrongType),
        };

        for value in values {
            match end {
                End::Front => list.push_front(value),
                End::Back => list.push_back(value),
            }
        }

        Ok(list.len())
    }

    /// Removes up to `count` elements from the given end. `None` when the list does not exist.
    pub fn pop(
        &mut self,
        key: &str,
        end: End,
        count: usize,
    ) -> Result<Option<Vec<Bytes>>, StoreError> {
        let list = match self.list(key)? {
            Some(list) => list,
            None => return Ok(None),
        };

        let count = count.min(list.len());
        let popped: Vec<Bytes> = match end {
            End::Front => list.drain(..count).collect(),
            End::Back => {
                let split = list.len() - count;
                list.drain(split..).rev().collect()
            }
        };

        self.remove_if_empty(key);
        Ok(Some(popped))
    }

    pub fn llen(&mut self, key: &str) -> Result<usize, StoreError> {
        Ok(self.list(key)?.map_or(0, |list| list.len()))
    }

    /// Returns the inclusive range `start..=stop`. Negative indices count from the tail, so
    /// `-1` is the last element.
    pub fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, StoreError> {
        let list = match self.list(key)? {
            Some(list) => list,
            None => return Ok(vec![]),
        };

        let len = list.len() as i64;
        let start = (if start < 0 { len + start } else { start }).max(0);
        let stop = (if stop < 0 { len + stop } else { stop }).min(len - 1);

        if start > stop || start >= len {
            return Ok(vec![]);
        }

        Ok(list
            .range(start as usize..=stop as usize)
            .cloned()
            .collect())
    }

    /// Adds members to the set at `key`. Returns how many were not already present.
    pub fn sadd(&mut self, key: &str, members: Vec<Bytes>) -> Result<usize, StoreError> {
        if members.is_empty() {
            self.set_members(key)?;
            return Ok(0);
        }

        let entry = self.entry_or_insert_with(key, || Value::Set(HashSet::new()));
        let set = match &mut entry.value {
            Value::Set(set) => set,
            _ => return Err(StoreError::WrongType),
        };

        Ok(members
            .into_iter()
            .filter(|member| set.insert(member.clone()))
            .count())
    }

    /// Removes members from the set at `key`. Returns how many were actually present.
    pub fn srem(&mut self, key: &str, members: &[Bytes]) -> Result<usize, StoreError> {
        let set = match self.set_members(key)? {
            Some(set) => set,
            None => return Ok(0),
        };

        let removed = members.iter().filter(|member| set.remove(*member)).count();
        self.remove_if_empty(key);
        Ok(removed)
    }

    pub fn smembers(&mut self, key: &str) -> Result<Vec<Bytes>, StoreError> {
        Ok(self
            .set_members(key)?
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn scard(&mut self, key: &str) -> Result<usize, StoreError> {
        Ok(self.set_members(key)?.map_or(0, |set| set.len()))
    }

    /// Upserts field/value pairs. Returns how many fields were newly created.
    pub fn hset(&mut self, key: &str, pairs: Vec<(Bytes, Bytes)>) -> Result<usize, StoreError> {
        let entry = self.entry_or_insert_with(key, || Value::Hash(HashMap::new()));
        let hash = match &mut entry.value {
            Value::Hash(hash) => hash,
            _ => return Err(StoreError::WrongType),
        };

        Ok(pairs
            .into_iter()
            .filter(|(field, value)| hash.insert(field.clone(), value.clone()).is_none())
            .count())
    }

    pub fn hget(&mut self, key: &str, field: &[u8]) -> Result<Option<Bytes>, StoreError> {
        Ok(self.hash(key)?.and_then(|hash| hash.get(field).cloned()))
    }

    pub fn hdel(&mut self, key: &str, fields: &[Bytes]) -> Result<usize, StoreError> {
        let hash = match self.hash(key)? {
            Some(hash) => hash,
            None => return Ok(0),
        };

        let removed = fields
            .iter()
            .filter(|field| hash.remove(*field).is_some())
            .count();
        self.remove_if_empty(key);
        Ok(removed)
    }

    pub fn hgetall(&mut self, key: &str) -> Result<Vec<(Bytes, Bytes)>, StoreError> {
        Ok(self
            .hash(key)?
            .map(|hash| {
                hash.iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    pub fn hlen(&mut self, key: &str) -> Result<usize, StoreError> {
        Ok(self.hash(key)?.map_or(0, |hash| hash.len()))
    }

    /// Drops every expired key and returns a copy of the rest, with the time each key has left.
    pub fn dump(&mut self) -> Vec<(String, Value, Option<Duration>)> {
        let now = Instant::now();
        self.state.keys.retain(|_, entry| !entry.is_expired(now));
        self.state
            .keys
            .iter()
            .map(|(key, entry)| {
                let ttl = entry
                    .expires_at
                    .map(|expires_at| expires_at.saturating_duration_since(now));
                (key.clone(), entry.value.clone(), ttl)
            })
            .collect()
    }

    /// Inserts a value as-is, e.g. when loading a snapshot.
    pub fn restore(&mut self, key: String, value: Value, ttl: Option<Duration>) {
        let entry = Entry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.state.keys.insert(key, entry);
    }
}
