use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Save the keyspace in the background. The reply only says the save has started; failures show
/// up in the server log.
///
/// Ref: <https://redis.io/docs/latest/commands/bgsave/>
#[derive(Debug, PartialEq)]
pub struct BgSave;

impl Executable for BgSave {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        ctx.persistence.background_save(ctx.store.clone());

        Ok(Frame::Simple("Background saving started".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for BgSave {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
