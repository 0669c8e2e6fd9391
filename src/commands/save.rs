use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Synchronously writes a snapshot of the whole keyspace to disk and truncates the append-only
/// log.
///
/// Ref: <https://redis.io/docs/latest/commands/save/>
#[derive(Debug, PartialEq)]
pub struct Save;

impl Executable for Save {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        ctx.persistence.save(&ctx.store)?;

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Save {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
