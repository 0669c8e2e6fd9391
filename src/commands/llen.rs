use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Returns the length of the list stored at key, 0 if the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/llen/>
#[derive(Debug, PartialEq)]
pub struct Llen {
    pub key: String,
}

impl Executable for Llen {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match ctx.store.lock().llen(&self.key) {
            Ok(len) => Ok(Frame::Integer(len as i64)),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Llen {
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
    use crate::store::End;
    use bytes::Bytes;

    #[test]
    fn length() {
        let ctx = Context::default();
        ctx.store
            .lock()
            .push("mylist", vec![Bytes::from("a"), Bytes::from("b")], End::Back)
            .unwrap();

        let cmd = Command::try_from(Frame::request(["LLEN", "mylist"])).unwrap();
        assert_eq!(
            cmd,
            Command::Llen(Llen {
                key: String::from("mylist")
            })
        );
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(2));

        let missing = Command::try_from(Frame::request(["LLEN", "other"])).unwrap();
        assert_eq!(missing.exec(&ctx).unwrap(), Frame::Integer(0));
    }
}
