use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Sets the specified fields to their respective values in the hash stored at key. Replies with
/// the number of fields that were added.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Debug, PartialEq)]
pub struct Hset {
    pub key: String,
    pub pairs: Vec<(Bytes, Bytes)>,
}

impl Executable for Hset {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match ctx.store.lock().hset(&self.key, self.pairs) {
            Ok(added) => Ok(Frame::Integer(added as i64)),
            Err(msg) => Ok(Frame::Error(msg.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Hset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        if parser.remaining() == 0 || parser.remaining() % 2 != 0 {
            return Err(parser.wrong_arity().into());
        }

        let mut pairs = vec![];
        while parser.remaining() > 0 {
            pairs.push((parser.next_bytes()?, parser.next_bytes()?));
        }

        Ok(Self { key, pairs })
    }
}
