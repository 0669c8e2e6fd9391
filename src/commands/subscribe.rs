use bytes::Bytes;
use std::collections::HashSet;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::pubsub::Sink;
use crate::Error;

/// Subscribes the client to the specified channels. Once subscribed, the connection only accepts
/// SUBSCRIBE, UNSUBSCRIBE, PING and QUIT until it leaves its last channel.
///
/// Ref: <https://redis.io/docs/latest/commands/subscribe/>
#[derive(Debug, PartialEq)]
pub struct Subscribe {
    pub channels: Vec<String>,
}

impl Subscribe {
    /// Registers `sink` on every channel and returns one acknowledgement per channel, carrying the
    /// channel's subscriber count.
    pub fn apply(
        self,
        ctx: &Context,
        client_id: u64,
        sink: &Sink,
        subscriptions: &mut HashSet<String>,
    ) -> Vec<Frame> {
        self.channels
            .into_iter()
            .map(|channel| {
                let count = ctx.pubsub.subscribe(&channel, client_id, sink.clone());
                subscriptions.insert(channel.clone());

                Frame::Array(vec![
                    Frame::Bulk(Bytes::from_static(b"subscribe")),
                    Frame::Bulk(Bytes::from(channel)),
                    Frame::Integer(count as i64),
                ])
            })
            .collect()
    }
}

impl Executable for Subscribe {
    fn exec(self, _ctx: &Context) -> Result<Frame, Error> {
        Ok(Frame::Error(
            "ERR SUBSCRIBE is only available on a client connection".to_string(),
        ))
    }
}

impl TryFrom<&mut CommandParser> for Subscribe {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channels = parser.rest_strings()?;
        Ok(Self { channels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use tokio::sync::mpsc;

    #[test]
    fn acknowledges_each_channel() {
        let frame = Frame::request(["SUBSCRIBE", "news", "sports"]);
        let cmd = Command::try_from(frame).unwrap();

        let subscribe = match cmd {
            Command::Subscribe(subscribe) => subscribe,
            cmd => panic!("expected subscribe, got {cmd:?}"),
        };
        assert_eq!(
            subscribe,
            Subscribe {
                channels: vec![String::from("news"), String::from("sports")]
            }
        );

        let ctx = Context::default();
        let (other, _other_rx) = mpsc::unbounded_channel();
        ctx.pubsub.subscribe("news", 99, other);

        let (sink, _rx) = mpsc::unbounded_channel();
        let mut subscriptions = HashSet::new();
        let acks = subscribe.apply(&ctx, 1, &sink, &mut subscriptions);

        assert_eq!(
            acks,
            vec![
                Frame::Array(vec![
                    Frame::Bulk(Bytes::from("subscribe")),
                    Frame::Bulk(Bytes::from("news")),
                    Frame::Integer(2),
                ]),
                Frame::Array(vec![
                    Frame::Bulk(Bytes::from("subscribe")),
                    Frame::Bulk(Bytes::from("sports")),
                    Frame::Integer(1),
                ]),
            ]
        );
        assert_eq!(subscriptions.len(), 2);
    }

    #[test]
    fn needs_a_connection() {
        let cmd = Command::try_from(Frame::request(["SUBSCRIBE", "news"])).unwrap();

        assert!(matches!(
            cmd.exec(&Context::default()).unwrap(),
            Frame::Error(_)
        ));
    }
}
