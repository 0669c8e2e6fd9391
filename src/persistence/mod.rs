//! Snapshot and append-only log persistence.
//!
//! Logged commands execute while the log lock is held, so the order of lines in the log is the
//! order in which their effects reached the store. A snapshot takes the same lock only long enough
//! to dump the store and rotate the log; serialising and writing happen after it is released.
//! Snapshot + rotated log + live log always equals the live state.

pub mod aof;
pub mod snapshot;

use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error as ThisError;
use tracing::{debug, error, info, warn};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::context::Context;
use crate::frame::Frame;
use crate::store::Store;
use aof::AppendOnlyFile;

pub const SNAPSHOT_FILE: &str = "dump.zedis.json";
pub const AOF_FILE: &str = "appendonly.aof";

#[derive(Debug, ThisError)]
pub enum PersistenceError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub keys: usize,
    pub replayed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Persistence {
    inner: Arc<Inner>,
}

struct Inner {
    snapshot_path: PathBuf,
    appendonly: AtomicBool,
    aof: Mutex<AppendOnlyFile>,
    /// Held for a whole save so two snapshots never interleave their rotations and writes.
    saving: Mutex<()>,
}

impl Persistence {
    pub fn new(dir: &Path, appendonly: bool) -> Persistence {
        let inner = Inner {
            snapshot_path: dir.join(SNAPSHOT_FILE),
            appendonly: AtomicBool::new(appendonly),
            aof: Mutex::new(AppendOnlyFile::new(dir.join(AOF_FILE))),
            saving: Mutex::new(()),
        };
        Persistence {
            inner: Arc::new(inner),
        }
    }

    fn aof(&self) -> MutexGuard<'_, AppendOnlyFile> {
        self.inner.aof.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.inner.snapshot_path
    }

    pub fn aof_path(&self) -> PathBuf {
        self.aof().path().to_path_buf()
    }

    fn rotated_aof_path(&self) -> PathBuf {
        self.aof().rotated_path().to_path_buf()
    }

    pub fn appendonly(&self) -> bool {
        self.inner.appendonly.load(Ordering::Relaxed)
    }

    pub fn set_appendonly(&self, enabled: bool) {
        self.inner.appendonly.store(enabled, Ordering::Relaxed);
    }

    /// Appends `args` to the log, then runs `exec` before releasing the log lock. A failed append
    /// is logged and the command still runs.
    pub fn record<T>(&self, args: &[Bytes], exec: impl FnOnce() -> T) -> T {
        let logged = args.first().is_some_and(|name| aof::is_logged(name));
        if !logged || !self.appendonly() {
            return exec();
        }

        let mut aof = self.aof();
        if let Err(e) = aof.append(args) {
            warn!(cause = %e, path = %aof.path().display(), "failed to append to log");
        }
        exec()
    }

    /// Writes a snapshot of `store` and drops the log lines it covers. Returns the number of keys
    /// saved.
    ///
    /// Only the dump and the log rotation happen under the log lock. If writing the snapshot
    /// fails the rotated log stays in place and is still replayed on the next load.
    pub fn save(&self, store: &Store) -> Result<usize, PersistenceError> {
        let _saving = self.inner.saving.lock().unwrap_or_else(PoisonError::into_inner);

        let entries = {
            let mut aof = self.aof();
            let entries = store.lock().dump();
            aof.rotate()?;
            entries
        };

        let keys = snapshot::write(&self.inner.snapshot_path, entries)?;
        self.aof().discard_rotated()?;

        info!(keys, path = %self.inner.snapshot_path.display(), "snapshot saved");
        Ok(keys)
    }

    /// Runs [`Persistence::save`] on the blocking pool. The outcome is only logged.
    pub fn background_save(&self, store: Store) {
        let persistence = self.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = persistence.save(&store) {
                error!(cause = %e, "background save failed");
            }
        });
    }

    /// Restores the snapshot, then replays the rotated log (left behind by an unfinished save) and
    /// the live log through the command table. Commands that fail during replay are logged and
    /// skipped.
    pub fn load(&self, ctx: &Context) -> Result<LoadStats, PersistenceError> {
        let mut stats = LoadStats::default();

        let entries = snapshot::read(&self.inner.snapshot_path)?;
        {
            let mut store = ctx.store.lock();
            for (key, value, ttl) in entries {
                store.restore(key, value, ttl);
                stats.keys += 1;
            }
        }

        let mut commands = aof::read_commands(&self.rotated_aof_path())?;
        commands.extend(aof::read_commands(&self.aof_path())?);

        for args in commands {
            if !aof::is_logged(&args[0]) {
                debug!(command = %String::from_utf8_lossy(&args[0]), "skipping unlogged command");
                continue;
            }

            let line = String::from_utf8_lossy(&aof::format_line(&args))
                .trim_end()
                .to_string();
            let frame = Frame::Array(args.into_iter().map(Frame::Bulk).collect());
            let result = Command::try_from(frame).and_then(|cmd| cmd.exec(ctx));

            match result {
                Ok(Frame::Error(reply)) => {
                    warn!(%line, %reply, "replayed command failed");
                    stats.failed += 1;
                }
                Ok(_) => stats.replayed += 1,
                Err(e) => {
                    warn!(%line, cause = %e, "replayed command failed");
                    stats.failed += 1;
                }
            }
        }

        info!(
            keys = stats.keys,
            replayed = stats.replayed,
            failed = stats.failed,
            "persistence loaded"
        );
        Ok(stats)
    }
}
