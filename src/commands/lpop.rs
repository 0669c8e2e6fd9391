use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::context::Context;
use crate::frame::Frame;
use crate::store::End;
use crate::Error;

/// Removes and returns the first elements of the list stored at key.
///
/// Without `count` the reply is a single element or nil. With `count` the reply is an array of
/// up to `count` elements, or nil when the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Lpop {
    pub key: String,
    pub count: Option<usize>,
}

impl Executable for Lpop {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        Ok(pop(ctx, &self.key, End::Front, self.count))
    }
}

impl TryFrom<&mut CommandParser> for Lpop {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = parse_count(parser)?;

        Ok(Self { key, count })
    }
}

/// Shared by LPOP and RPOP.
pub(crate) fn pop(ctx: &Context, key: &str, end: End, count: Option<usize>) -> Frame {
    let res = ctx.store.lock().pop(key, end, count.unwrap_or(1));

    match (res, count) {
        (Err(msg), _) => Frame::Error(msg.to_string()),
        (Ok(None), _) => Frame::Null,
        (Ok(Some(values)), Some(_)) => {
            Frame::Array(values.into_iter().map(Frame::Bulk).collect())
        }
        (Ok(Some(values)), None) => values
            .into_iter()
            .next()
            .map_or(Frame::Null, Frame::Bulk),
    }
}

pub(crate) fn parse_count(parser: &mut CommandParser) -> Result<Option<usize>, CommandParserError> {
    if parser.remaining() == 0 {
        return Ok(None);
    }

    let count = parser.next_integer()?;
    usize::try_from(count)
        .map(Some)
        .map_err(|_| CommandParserError::NotPositive)
}
