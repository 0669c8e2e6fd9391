use bytes::Bytes;
use std::collections::HashSet;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Unsubscribes the client from the given channels.
///
/// Ref: <https://redis.io/docs/latest/commands/unsubscribe/>
#[derive(Debug, PartialEq)]
pub struct Unsubscribe {
    pub channels: Vec<String>,
}

impl Unsubscribe {
    /// Removes the client from every channel and returns one acknowledgement per channel,
    /// carrying the number of subscriptions the client has left.
    pub fn apply(
        self,
        ctx: &Context,
        client_id: u64,
        subscriptions: &mut HashSet<String>,
    ) -> Vec<Frame> {
        self.channels
            .into_iter()
            .map(|channel| {
                ctx.pubsub.unsubscribe(&channel, client_id);
                subscriptions.remove(&channel);

                Frame::Array(vec![
                    Frame::Bulk(Bytes::from_static(b"unsubscribe")),
                    Frame::Bulk(Bytes::from(channel)),
                    Frame::Integer(subscriptions.len() as i64),
                ])
            })
            .collect()
    }
}

impl Executable for Unsubscribe {
    fn exec(self, _ctx: &Context) -> Result<Frame, Error> {
        Ok(Frame::Error(
            "ERR UNSUBSCRIBE is only available on a client connection".to_string(),
        ))
    }
}

impl TryFrom<&mut CommandParser> for Unsubscribe {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channels = parser.rest_strings()?;
        Ok(Self { channels })
    }
}
