use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Set key to hold string value if key does not exist. Replies 1 if the key was set, 0 otherwise.
///
/// Ref: <https://redis.io/docs/latest/commands/setnx/>
#[derive(Debug, PartialEq)]
pub struct Setnx {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Setnx {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let set = ctx.store.lock().set_nx(self.key, self.value);

        Ok(Frame::Integer(i64::from(set)))
    }
}

impl TryFrom<&mut CommandParser> for Setnx {
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
    fn only_sets_missing_keys() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("SETNX")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("first")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Setnx(Setnx {
                key: String::from("key1"),
                value: Bytes::from("first")
            })
        );

        let ctx = Context::default();
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(1));

        let again = Command::try_from(Frame::request(["SETNX", "key1", "second"])).unwrap();
        assert_eq!(again.exec(&ctx).unwrap(), Frame::Integer(0));
        assert_eq!(ctx.store.lock().get("key1"), Ok(Some(Bytes::from("first"))));
    }
}
