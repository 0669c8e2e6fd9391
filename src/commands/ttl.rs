use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::store;
use crate::Error;

/// Returns the remaining time to live of a key that has a timeout, in whole seconds. -1 when the
/// key has no timeout, -2 when it does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/ttl/>
#[derive(Debug, PartialEq)]
pub struct Ttl {
    pub key: String,
}

impl Executable for Ttl {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let ttl = match ctx.store.lock().ttl(&self.key) {
            store::Ttl::Missing => -2,
            store::Ttl::Persistent => -1,
            store::Ttl::Remaining(remaining) => remaining.as_secs() as i64,
        };

        Ok(Frame::Integer(ttl))
    }
}

impl TryFrom<&mut CommandParser> for Ttl {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use bytes::Bytes;
    use std::time::Duration;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn remaining_seconds() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("TTL")),
            Frame::Bulk(Bytes::from("key1")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Ttl(Ttl {
                key: "key1".to_string()
            })
        );

        let ctx = Context::default();
        ctx.store
            .lock()
            .set_with_ttl("key1".to_string(), Bytes::from("v"), Duration::from_secs(10));
        time::advance(Duration::from_millis(2500)).await;

        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(7));
    }

    #[test]
    fn persistent_and_missing() {
        let ctx = Context::default();
        ctx.store.lock().set("key1".to_string(), Bytes::from("v"));

        let persistent = Command::try_from(Frame::request(["TTL", "key1"])).unwrap();
        let missing = Command::try_from(Frame::request(["TTL", "key2"])).unwrap();

        assert_eq!(persistent.exec(&ctx).unwrap(), Frame::Integer(-1));
        assert_eq!(missing.exec(&ctx).unwrap(), Frame::Integer(-2));
    }
}
