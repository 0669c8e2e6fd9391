use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Returns the number of fields contained in the hash stored at key.
///
/// Ref: <https://redis.io/docs/latest/commands/hlen/>
#[derive(Debug, PartialEq)]
pub struct Hlen {
    pub key: String,
}

impl Executable for Hlen {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match ctx.store.lock().hlen(&self.key) {
            Ok(len) => Ok(Frame::Integer(len as i64)),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Hlen {
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

    #[test]
    fn field_count() {
        let ctx = Context::default();
        ctx.store
            .lock()
            .hset(
                "user",
                vec![
                    (Bytes::from("name"), Bytes::from("Marko")),
                    (Bytes::from("age"), Bytes::from("30")),
                ],
            )
            .unwrap();

        let cmd = Command::try_from(Frame::request(["HLEN", "user"])).unwrap();
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(2));

        let cmd = Command::try_from(Frame::request(["HLEN", "nobody"])).unwrap();
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(0));
    }
}
