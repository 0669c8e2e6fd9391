use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Returns all fields and values of the hash stored at key, as a flat `field, value, ...` list.
///
/// Ref: <https://redis.io/docs/latest/commands/hgetall/>
#[derive(Debug, PartialEq)]
pub struct HgetAll {
    pub key: String,
}

impl Executable for HgetAll {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match ctx.store.lock().hgetall(&self.key) {
            Ok(pairs) => Ok(Frame::Array(
                pairs
                    .into_iter()
                    .flat_map(|(field, value)| [Frame::Bulk(field), Frame::Bulk(value)])
                    .collect(),
            )),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for HgetAll {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
