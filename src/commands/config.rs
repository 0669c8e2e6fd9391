use bytes::Bytes;
use tracing::info;

use crate::auth;
use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::config::is_yes;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

/// Reads or changes a configuration option at runtime.
///
/// `CONFIG SET` rewrites the config file. `requirepass` is stored as a salted hash, and
/// `appendonly` is applied to the running server straight away.
///
/// Ref: <https://redis.io/docs/latest/commands/config-get/>
#[derive(Debug, PartialEq)]
pub enum Config {
    Get { key: String },
    Set { key: String, value: String },
}

impl Config {
    /// Hashes a plaintext `requirepass` value on the blocking pool, so that `exec` stores it as is
    /// without running the key derivation on the caller's thread.
    pub async fn hash_credentials(self) -> Result<Config, Error> {
        match self {
            Config::Set { key, value }
                if key.eq_ignore_ascii_case("requirepass")
                    && !value.is_empty()
                    && !auth::is_hashed(&value) =>
            {
                let value = tokio::task::spawn_blocking(move || auth::hash_password(&value)).await?;
                Ok(Config::Set { key, value })
            }
            config => Ok(config),
        }
    }
}

impl Executable for Config {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match self {
            Config::Get { key } => {
                let res = match ctx.config.get(&key) {
                    Some(value) => Frame::Array(vec![
                        Frame::Bulk(Bytes::from(key.to_lowercase())),
                        Frame::Bulk(Bytes::from(value)),
                    ]),
                    None => Frame::Null,
                };
                Ok(res)
            }
            Config::Set { key, value } => {
                let key = key.to_lowercase();
                let value = match key.as_str() {
                    "requirepass" if !value.is_empty() && !auth::is_hashed(&value) => {
                        auth::hash_password(&value)
                    }
                    _ => value,
                };

                ctx.config.set(&key, &value)?;
                if key == "appendonly" {
                    ctx.persistence.set_appendonly(is_yes(&value));
                }

                // The value itself may be a credential.
                info!(%key, "config updated");
                Ok(Frame::Simple("OK".to_string()))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Config {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?.to_lowercase();

        match (subcommand.as_str(), parser.remaining()) {
            ("get", 1) => Ok(Config::Get {
                key: parser.next_string()?,
            }),
            ("set", n) if n >= 2 => {
                let key = parser.next_string()?;
                let value = parser.rest_strings()?.join(" ");
                Ok(Config::Set { key, value })
            }
            _ => Err(parser.invalid_syntax().into()),
        }
    }
}
