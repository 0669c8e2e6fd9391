use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Sets the given keys to their respective values. MSET replaces existing values with new values,
/// just as regular SET. MSET is atomic, so all given keys are set at once.
///
/// Ref: <https://redis.io/docs/latest/commands/mset/>
#[derive(Debug, PartialEq)]
pub struct Mset {
    pub pairs: Vec<(String, Bytes)>,
}

impl Executable for Mset {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let mut store = ctx.store.lock();

        for (key, value) in self.pairs {
            store.set(key, value);
        }

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Mset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() % 2 != 0 {
            return Err(parser.wrong_arity().into());
        }

        let mut pairs = vec![];
        while parser.remaining() > 0 {
            pairs.push((parser.next_string()?, parser.next_bytes()?));
        }

        Ok(Self { pairs })
    }
}
