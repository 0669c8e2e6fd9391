use std::time::Instant;
use tracing::info;

use crate::config::Config;
use crate::persistence::Persistence;
use crate::pubsub::PubSub;
use crate::session::Sessions;
use crate::store::Store;
use crate::Error;

/// Handles shared by every connection. Cloning is cheap; all clones see the same state.
#[derive(Clone)]
pub struct Context {
    pub store: Store,
    pub pubsub: PubSub,
    pub sessions: Sessions,
    pub config: Config,
    pub persistence: Persistence,
    pub started_at: Instant,
}

impl Context {
    pub fn new(config: Config) -> Context {
        let persistence = Persistence::new(&config.dir(), config.appendonly());

        Context {
            store: Store::new(),
            pubsub: PubSub::new(),
            sessions: Sessions::new(),
            config,
            persistence,
            started_at: Instant::now(),
        }
    }

    /// Builds the context and, when `loadstart` is enabled, restores the snapshot and replays the
    /// append-only log before any client can connect.
    pub fn bootstrap(config: Config) -> Result<Context, Error> {
        let ctx = Context::new(config);

        if ctx.config.loadstart() {
            ctx.persistence.load(&ctx)?;
        } else {
            info!("loadstart disabled, starting with an empty keyspace");
        }

        Ok(ctx)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Config::default())
    }
}
