//! Channel registry and message fan-out.
//!
//! Every connection owns an unbounded mpsc receiver; its sender is the connection's sink. The
//! registry maps a channel name to the sinks subscribed to it, keyed by client id so a connection
//! appears at most once per channel. Channels without subscribers are removed.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::frame::Frame;

/// Outbound half of a connection. Frames sent here are written to the client socket.
pub type Sink = UnboundedSender<Frame>;

#[derive(Clone, Default)]
pub struct PubSub {
    channels: Arc<Mutex<HashMap<String, HashMap<u64, Sink>>>>,
}

impl PubSub {
    pub fn new() -> PubSub {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HashMap<u64, Sink>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `sink` to `channel`. Subscribing twice is a no-op. Returns the number of subscribers
    /// the channel has afterwards.
    pub fn subscribe(&self, channel: &str, client_id: u64, sink: Sink) -> usize {
        let mut channels = self.lock();
        let subscribers = channels.entry(channel.to_string()).or_default();
        subscribers.entry(client_id).or_insert(sink);
        subscribers.len()
    }

    /// Removes the client from `channel`. Returns whether it was subscribed.
    pub fn unsubscribe(&self, channel: &str, client_id: u64) -> bool {
        let mut channels = self.lock();
        remove_subscriber(&mut channels, channel, client_id)
    }

    /// Removes the client from every channel. Called when its connection goes away.
    pub fn unsubscribe_all(&self, client_id: u64) {
        let mut channels = self.lock();
        channels.retain(|_, subscribers| {
            subscribers.remove(&client_id);
            !subscribers.is_empty()
        });
    }

    /// Delivers `message` to every subscriber of `channel`.
    ///
    /// The subscriber list is copied under the lock and delivery happens after releasing it.
    /// Subscribers whose sink is closed are dropped from the registry. The returned count is the
    /// number of subscribers at publish time, including the ones found dead.
    pub fn publish(&self, channel: &str, message: Bytes) -> usize {
        let subscribers: Vec<(u64, Sink)> = match self.lock().get(channel) {
            Some(subscribers) => subscribers
                .iter()
                .map(|(id, sink)| (*id, sink.clone()))
                .collect(),
            None => return 0,
        };

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from_static(b"message")),
            Frame::Bulk(Bytes::copy_from_slice(channel.as_bytes())),
            Frame::Bulk(message),
        ]);

        let dead: Vec<u64> = subscribers
            .iter()
            .filter(|(_, sink)| sink.send(frame.clone()).is_err())
            .map(|(id, _)| *id)
            .collect();

        if !dead.is_empty() {
            debug!(channel, count = dead.len(), "dropping closed subscribers");
            let mut channels = self.lock();
            for id in dead {
                remove_subscriber(&mut channels, channel, id);
            }
        }

        subscribers.len()
    }

    /// Number of channels with at least one subscriber.
    pub fn channel_count(&self) -> usize {
        self.lock().len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, |subscribers| subscribers.len())
    }
}

fn remove_subscriber(
    channels: &mut HashMap<String, HashMap<u64, Sink>>,
    channel: &str,
    client_id: u64,
) -> bool {
    let Some(subscribers) = channels.get_mut(channel) else {
        return false;
    };

    let removed = subscribers.remove(&client_id).is_some();
    if subscribers.is_empty() {
        channels.remove(channel);
    }
    removed
}
