use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Posts a message to the given channel. Replies with the number of subscribers the channel had
/// when the message was published.
///
/// Ref: <https://redis.io/docs/latest/commands/publish/>
#[derive(Debug, PartialEq)]
pub struct Publish {
    pub channel: String,
    pub message: Bytes,
}

impl Executable for Publish {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let receivers = ctx.pubsub.publish(&self.channel, self.message);

        Ok(Frame::Integer(receivers as i64))
    }
}

impl TryFrom<&mut CommandParser> for Publish {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channel = parser.next_string()?;
        let message = parser.rest_joined()?;

        Ok(Self { channel, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use tokio::sync::mpsc;

    #[test]
    fn delivers_to_subscribers() {
        let frame = Frame::request(["PUBLISH", "news", "hello", "world"]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Publish(Publish {
                channel: String::from("news"),
                message: Bytes::from("hello world")
            })
        );

        let ctx = Context::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        ctx.pubsub.subscribe("news", 1, tx);

        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(1));
        assert_eq!(
            rx.try_recv().unwrap(),
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("message")),
                Frame::Bulk(Bytes::from("news")),
                Frame::Bulk(Bytes::from("hello world")),
            ])
        );
    }

    #[test]
    fn no_subscribers() {
        let ctx = Context::default();
        let cmd = Command::try_from(Frame::request(["PUBLISH", "news", "hello"])).unwrap();

        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(0));
    }
}
