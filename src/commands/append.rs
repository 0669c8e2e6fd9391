use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// If key already exists and is a string, this command appends the value at the end of the
/// string. If key does not exist it is created and set as an empty string, so APPEND will be
/// similar to SET in this special case.
///
/// Ref: <https://redis.io/docs/latest/commands/append/>
#[derive(Debug, PartialEq)]
pub struct Append {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Append {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let res = ctx.store.lock().append(&self.key, &self.value);

        match res {
            Ok(len) => Ok(Frame::Integer(len as i64)),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Append {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.rest_joined()?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn existing_key() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("APPEND")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from(" World")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Append(Append {
                key: String::from("key1"),
                value: Bytes::from(" World")
            })
        );

        let ctx = Context::default();
        ctx.store.lock().set(String::from("key1"), Bytes::from("Hello"));

        let res = cmd.exec(&ctx).unwrap();

        assert_eq!(res, Frame::Integer(11));
        assert_eq!(
            ctx.store.lock().get("key1"),
            Ok(Some(Bytes::from("Hello World")))
        );
    }

    #[test]
    fn non_existing_key() {
        let ctx = Context::default();
        let cmd = Command::try_from(Frame::request(["APPEND", "key1", "a", "b"])).unwrap();

        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(3));
        assert_eq!(ctx.store.lock().get("key1"), Ok(Some(Bytes::from("a b"))));
    }
}
