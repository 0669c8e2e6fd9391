use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Add the specified members to the set stored at key. Replies with the number of members that
/// were added, not including members already present.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd/>
#[derive(Debug, PartialEq)]
pub struct Sadd {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Executable for Sadd {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match ctx.store.lock().sadd(&self.key, self.members) {
            Ok(added) => Ok(Frame::Integer(added as i64)),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Sadd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.rest_bytes()?;

        Ok(Self { key, members })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn adds_new_members() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("SADD")),
            Frame::Bulk(Bytes::from("myset")),
            Frame::Bulk(Bytes::from("a")),
            Frame::Bulk(Bytes::from("b")),
            Frame::Bulk(Bytes::from("a")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Sadd(Sadd {
                key: String::from("myset"),
                members: vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("a")]
            })
        );

        let ctx = Context::default();
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(2));

        let again = Command::try_from(Frame::request(["SADD", "myset", "b", "c"])).unwrap();
        assert_eq!(again.exec(&ctx).unwrap(), Frame::Integer(1));
        assert_eq!(ctx.store.lock().scard("myset"), Ok(3));
    }

    #[test]
    fn no_members() {
        let ctx = Context::default();
        let cmd = Command::try_from(Frame::request(["SADD", "myset"])).unwrap();

        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(0));
        assert!(!ctx.store.lock().exists("myset"));
    }
}
