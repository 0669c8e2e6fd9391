use std::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{parse_seconds, CommandParser};
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Set a timeout on `key`. After the timeout has expired, the key will automatically be deleted.
/// Replies 1 if the timeout was set and 0 if the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/expire/>
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: String,
    pub seconds: u64,
}

impl Executable for Expire {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let set = ctx
            .store
            .lock()
            .expire(&self.key, Duration::from_secs(self.seconds));

        Ok(Frame::Integer(i64::from(set)))
    }
}

impl TryFrom<&mut CommandParser> for Expire {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let seconds = parse_seconds(parser)?;

        Ok(Self { key, seconds })
    }
}
