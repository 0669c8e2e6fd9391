//! Registry of connected clients.
//!
//! Every accepted connection registers a [`Session`] and holds on to the returned
//! [`SessionGuard`]. Dropping the guard removes the record, so a connection is unregistered
//! exactly once no matter how its handler exits.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct Session {
    pub id: u64,
    pub addr: String,
    pub connected_at: Instant,
    pub last_active: Instant,
    pub authenticated: bool,
    pub subscriptions: usize,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} addr={} age={} idle={} sub={}",
            self.id,
            self.addr,
            self.connected_at.elapsed().as_secs(),
            self.last_active.elapsed().as_secs(),
            self.subscriptions
        )
    }
}

#[derive(Clone, Default)]
pub struct Sessions {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    sessions: Mutex<HashMap<u64, Session>>,
}

impl Sessions {
    pub fn new() -> Sessions {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Session>> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new client and returns the guard that keeps it registered. Ids start at 1 and
    /// are never reused.
    pub fn register(&self, addr: impl Into<String>, authenticated: bool) -> SessionGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let now = Instant::now();
        let session = Session {
            id,
            addr: addr.into(),
            connected_at: now,
            last_active: now,
            authenticated,
            subscriptions: 0,
        };
        self.lock().insert(id, session);

        SessionGuard {
            id,
            sessions: self.clone(),
        }
    }

    /// Marks the session as active now.
    pub fn touch(&self, id: u64) {
        self.update(id, |session| session.last_active = Instant::now());
    }

    pub fn update(&self, id: u64, f: impl FnOnce(&mut Session)) {
        if let Some(session) = self.lock().get_mut(&id) {
            f(session);
        }
    }

    /// Snapshot of every registered session, ordered by id.
    pub fn list(&self) -> Vec<Session> {
        let mut sessions: Vec<Session> = self.lock().values().cloned().collect();
        sessions.sort_by_key(|session| session.id);
        sessions
    }

    /// Number of connected clients.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }
}

pub struct SessionGuard {
    id: u64,
    sessions: Sessions,
}

impl SessionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(self.id);
    }
}
