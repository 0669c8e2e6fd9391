use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Removes the specified fields from the hash stored at key. A hash left empty is deleted.
///
/// Ref: <https://redis.io/docs/latest/commands/hdel/>
#[derive(Debug, PartialEq)]
pub struct Hdel {
    pub key: String,
    pub fields: Vec<Bytes>,
}

impl Executable for Hdel {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match ctx.store.lock().hdel(&self.key, &self.fields) {
            Ok(removed) => Ok(Frame::Integer(removed as i64)),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Hdel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let fields = parser.rest_bytes()?;

        Ok(Self { key, fields })
    }
}
