use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Returns the values of all specified keys. For every key that does not hold a string value or
/// does not exist, the special value nil is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/mget/>
#[derive(Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<String>,
}

impl Executable for Mget {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let mut store = ctx.store.lock();
        let values = self
            .keys
            .iter()
            .map(|key| match store.get(key) {
                Ok(Some(value)) => Frame::Bulk(value),
                _ => Frame::Null,
            })
            .collect::<Vec<_>>();

        Ok(Frame::Array(values))
    }
}

impl TryFrom<&mut CommandParser> for Mget {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;

        Ok(Self { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::store::End;
    use bytes::Bytes;

    #[test]
    fn multiple_keys() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("MGET")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("key2")),
            Frame::Bulk(Bytes::from("list")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Mget(Mget {
                keys: vec![
                    String::from("key1"),
                    String::from("key2"),
                    String::from("list")
                ]
            })
        );

        let ctx = Context::default();
        {
            let mut store = ctx.store.lock();
            store.set(String::from("key1"), Bytes::from("1"));
            store.push("list", vec![Bytes::from("a")], End::Back).unwrap();
        }

        let res = cmd.exec(&ctx).unwrap();

        assert_eq!(
            res,
            Frame::Array(vec![Frame::Bulk(Bytes::from("1")), Frame::Null, Frame::Null])
        );
    }
}
