use crate::commands::executable::Executable;
use crate::commands::lpop::{parse_count, pop};
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::store::End;
use crate::Error;

/// Removes and returns the last elements of the list stored at key, tail first.
///
/// Ref: <https://redis.io/docs/latest/commands/rpop/>
#[derive(Debug, PartialEq)]
pub struct Rpop {
    pub key: String,
    pub count: Option<usize>,
}

impl Executable for Rpop {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        Ok(pop(ctx, &self.key, End::Back, self.count))
    }
}

impl TryFrom<&mut CommandParser> for Rpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = parse_count(parser)?;

        Ok(Self { key, count })
    }
}
