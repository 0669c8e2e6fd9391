use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Returns how many of the given keys exist. A key mentioned several times is counted each time.
///
/// Ref: <https://redis.io/docs/latest/commands/exists/>
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub keys: Vec<String>,
}

impl Executable for Exists {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let mut store = ctx.store.lock();
        let count = self.keys.iter().filter(|key| store.exists(key)).count();

        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Exists {
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
    use bytes::Bytes;

    #[test]
    fn counts_duplicates() {
        let frame = Frame::request(["EXISTS", "a", "a", "missing"]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Exists(Exists {
                keys: vec!["a".to_string(), "a".to_string(), "missing".to_string()]
            })
        );

        let ctx = Context::default();
        ctx.store.lock().set("a".to_string(), Bytes::from("1"));

        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(2));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_key_does_not_exist() {
        let ctx = Context::default();
        ctx.store.lock().set_with_ttl(
            "a".to_string(),
            Bytes::from("1"),
            std::time::Duration::from_secs(1),
        );

        tokio::time::advance(std::time::Duration::from_secs(1)).await;

        let cmd = Command::try_from(Frame::request(["EXISTS", "a"])).unwrap();
        assert_eq!(cmd.exec(&ctx).unwrap(), Frame::Integer(0));
    }
}
