use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::store::End;
use crate::Error;

/// Insert all the specified values at the head of the list stored at key. Elements are inserted
/// one after the other, so `LPUSH mylist a b c` leaves `c` as the first element.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match ctx.store.lock().push(&self.key, self.values, End::Front) {
            Ok(len) => Ok(Frame::Integer(len as i64)),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let values = parser.rest_bytes()?;

        Ok(Self { key, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn pushes_to_the_head() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPUSH")),
            Frame::Bulk(Bytes::from("mylist")),
            Frame::Bulk(Bytes::from("a")),
            Frame::Bulk(Bytes::from("b")),
            Frame::Bulk(Bytes::from("c")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Lpush(Lpush {
                key: String::from("mylist"),
                values: vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]
            })
        );

        let ctx = Context::default();
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(3));
        assert_eq!(
            ctx.store.lock().lrange("mylist", 0, -1),
            Ok(vec![Bytes::from("c"), Bytes::from("b"), Bytes::from("a")])
        );
    }

    #[test]
    fn wrong_type() {
        let ctx = Context::default();
        ctx.store.lock().set("key".to_string(), Bytes::from("v"));

        let cmd = Command::try_from(Frame::request(["LPUSH", "key", "a"])).unwrap();

        assert_eq!(
            cmd.exec(&ctx).unwrap(),
            Frame::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string()
            )
        );
    }
}
