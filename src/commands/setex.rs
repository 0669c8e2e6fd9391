use bytes::Bytes;
use std::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{parse_seconds, CommandParser, CommandParserError};
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Set key to hold the string value and set key to timeout after a given number of seconds.
///
/// Ref: <https://redis.io/docs/latest/commands/setex/>
#[derive(Debug, PartialEq)]
pub struct Setex {
    pub key: String,
    pub seconds: u64,
    pub value: Bytes,
}

impl Executable for Setex {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        ctx.store
            .lock()
            .set_with_ttl(self.key, self.value, Duration::from_secs(self.seconds));

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Setex {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let seconds = parse_seconds(parser)?;
        if seconds == 0 {
            return Err(CommandParserError::InvalidExpireTime.into());
        }
        let value = parser.rest_joined()?;

        Ok(Self {
            key,
            seconds,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn value_expires() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("SETEX")),
            Frame::Bulk(Bytes::from("session")),
            Frame::Bulk(Bytes::from("5")),
            Frame::Bulk(Bytes::from("token")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Setex(Setex {
                key: String::from("session"),
                seconds: 5,
                value: Bytes::from("token")
            })
        );

        let ctx = Context::default();
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Simple("OK".to_string()));
        assert_eq!(
            ctx.store.lock().get("session"),
            Ok(Some(Bytes::from("token")))
        );

        time::advance(Duration::from_secs(5)).await;
        assert_eq!(ctx.store.lock().get("session"), Ok(None));
    }

    #[test]
    fn invalid_expire_time() {
        for seconds in ["0", "-5", "soon"] {
            let frame = Frame::request(["SETEX", "session", seconds, "token"]);
            let err = Command::try_from(frame).err().unwrap();

            assert_eq!(err.to_string(), "ERR invalid expiration time");
        }
    }
}
