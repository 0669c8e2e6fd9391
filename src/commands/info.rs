use bytes::Bytes;
use itertools::Itertools;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

const SECTIONS: [&str; 5] = ["server", "clients", "pubsub", "config", "keyspace"];

/// Returns information and statistics about the server as `key:value` lines grouped in sections.
/// An optional argument selects a single section.
///
/// Ref: <https://redis.io/docs/latest/commands/info/>
#[derive(Debug, PartialEq)]
pub struct Info {
    pub section: Option<String>,
}

impl Executable for Info {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        let wanted = self.section.map(|section| section.to_lowercase());

        let info = SECTIONS
            .iter()
            .filter(|name| wanted.as_deref().map_or(true, |wanted| wanted == **name))
            .map(|name| section(ctx, name))
            .join("\r\n");

        Ok(Frame::Bulk(Bytes::from(info)))
    }
}

fn section(ctx: &Context, name: &str) -> String {
    let yes_no = |enabled: bool| if enabled { "yes" } else { "no" };

    let (title, lines) = match name {
        "server" => (
            "Server",
            vec![
                format!("zedis_version:{}", env!("CARGO_PKG_VERSION")),
                format!("process_id:{}", std::process::id()),
                format!("tcp_port:{}", ctx.config.port()),
                format!("uptime_in_seconds:{}", ctx.started_at.elapsed().as_secs()),
            ],
        ),
        "clients" => (
            "Clients",
            vec![format!("connected_clients:{}", ctx.sessions.count())],
        ),
        "pubsub" => (
            "PubSub",
            vec![format!("pubsub_channels:{}", ctx.pubsub.channel_count())],
        ),
        "config" => (
            "Config",
            vec![
                format!("appendonly:{}", yes_no(ctx.persistence.appendonly())),
                format!("loadstart:{}", yes_no(ctx.config.loadstart())),
                format!("requirepass:{}", yes_no(ctx.config.requirepass().is_some())),
            ],
        ),
        _ => {
            let store = ctx.store.lock();
            (
                "Keyspace",
                vec![
                    format!("keys:{}", store.size()),
                    format!("expires:{}", store.volatile_size()),
                ],
            )
        }
    };

    format!("# {}\r\n{}\r\n", title, lines.iter().join("\r\n"))
}

impl TryFrom<&mut CommandParser> for Info {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let section = match parser.remaining() {
            0 => None,
            _ => Some(parser.next_string()?),
        };

        Ok(Self { section })
    }
}
