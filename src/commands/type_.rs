use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Returns the string representation of the type of the value stored at key: `string`, `list`,
/// `set` or `hash`, and `none` when the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/type/>
#[derive(Debug, PartialEq)]
pub struct Type {
    pub key: String,
}

impl Executable for Type {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let kind = ctx
            .store
            .lock()
            .kind(&self.key)
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "none".to_string());

        Ok(Frame::Simple(kind))
    }
}

impl TryFrom<&mut CommandParser> for Type {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
