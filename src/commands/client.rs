use bytes::Bytes;
use itertools::Itertools;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Connection introspection. `CLIENT LIST` returns one line per connected client and
/// `CLIENT ID` the id of the calling connection. `CLIENT SETINFO` is accepted and ignored, so
/// client libraries that announce themselves on connect keep working.
///
/// Ref: <https://redis.io/docs/latest/commands/client-list/>
#[derive(Debug, PartialEq)]
pub enum Client {
    List,
    Id,
    SetInfo,
}

impl Client {
    pub fn exec_for(self, ctx: &Context, client_id: u64) -> Frame {
        match self {
            Client::List => {
                let lines = ctx.sessions.list().iter().join("\n");
                Frame::Bulk(Bytes::from(lines))
            }
            Client::Id => Frame::Integer(client_id as i64),
            Client::SetInfo => Frame::Simple("OK".to_string()),
        }
    }
}

impl Executable for Client {
    /// Without a connection there is no caller, so `CLIENT ID` reports 0.
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        Ok(self.exec_for(ctx, 0))
    }
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?.to_lowercase();

        match (subcommand.as_str(), parser.remaining()) {
            ("list", 0) => Ok(Client::List),
            ("id", 0) => Ok(Client::Id),
            ("setinfo", 2) => Ok(Client::SetInfo),
            _ => Err(parser.invalid_syntax().into()),
        }
    }
}
