pub mod append;
pub mod auth;
pub mod bgsave;
pub mod client;
pub mod config;
pub mod decr;
pub mod decrby;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod expire;
pub mod get;
pub mod hdel;
pub mod hget;
pub mod hgetall;
pub mod hlen;
pub mod hset;
pub mod incr;
pub mod incrby;
pub mod info;
pub mod llen;
pub mod lpop;
pub mod lpush;
pub mod lrange;
pub mod mget;
pub mod mset;
pub mod ping;
pub mod publish;
pub mod quit;
pub mod rpop;
pub mod rpush;
pub mod sadd;
pub mod save;
pub mod scard;
pub mod set;
pub mod setex;
pub mod setnx;
pub mod smembers;
pub mod srem;
pub mod strlen;
pub mod subscribe;
pub mod ttl;
pub mod type_;
pub mod unsubscribe;

use bytes::{Bytes, BytesMut};
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::context::Context;
use crate::frame::Frame;
use crate::Error;

use append::Append;
use auth::Auth;
use bgsave::BgSave;
use client::Client;
use config::Config;
use decr::Decr;
use decrby::DecrBy;
use del::Del;
use echo::Echo;
use exists::Exists;
use expire::Expire;
use get::Get;
use hdel::Hdel;
use hget::Hget;
use hgetall::HgetAll;
use hlen::Hlen;
use hset::Hset;
use incr::Incr;
use incrby::IncrBy;
use info::Info;
use llen::Llen;
use lpop::Lpop;
use lpush::Lpush;
use lrange::Lrange;
use mget::Mget;
use mset::Mset;
use ping::Ping;
use publish::Publish;
use quit::Quit;
use rpop::Rpop;
use rpush::Rpush;
use sadd::Sadd;
use save::Save;
use scard::Scard;
use set::Set;
use setex::Setex;
use setnx::Setnx;
use smembers::Smembers;
use srem::Srem;
use strlen::Strlen;
use subscribe::Subscribe;
use ttl::Ttl;
use type_::Type;
use unsubscribe::Unsubscribe;

#[derive(Debug, PartialEq)]
pub enum Command {
    Append(Append),
    Decr(Decr),
    DecrBy(DecrBy),
    Del(Del),
    Echo(Echo),
    Exists(Exists),
    Expire(Expire),
    Get(Get),
    Incr(Incr),
    IncrBy(IncrBy),
    Mget(Mget),
    Mset(Mset),
    Set(Set),
    Setex(Setex),
    Setnx(Setnx),
    Strlen(Strlen),
    Ttl(Ttl),
    Type(Type),

    Llen(Llen),
    Lpop(Lpop),
    Lpush(Lpush),
    Lrange(Lrange),
    Rpop(Rpop),
    Rpush(Rpush),

    Sadd(Sadd),
    Scard(Scard),
    Smembers(Smembers),
    Srem(Srem),

    Hdel(Hdel),
    Hget(Hget),
    HgetAll(HgetAll),
    Hlen(Hlen),
    Hset(Hset),

    Publish(Publish),
    Subscribe(Subscribe),
    Unsubscribe(Unsubscribe),

    Auth(Auth),
    BgSave(BgSave),
    Client(Client),
    Config(Config),
    Info(Info),
    Ping(Ping),
    Quit(Quit),
    Save(Save),
}

impl Executable for Command {
    fn exec(self, ctx: &Context) -> Result<Frame, Error> {
        match self {
            Command::Append(cmd) => cmd.exec(ctx),
            Command::Auth(cmd) => cmd.exec(ctx),
            Command::BgSave(cmd) => cmd.exec(ctx),
            Command::Client(cmd) => cmd.exec(ctx),
            Command::Config(cmd) => cmd.exec(ctx),
            Command::Decr(cmd) => cmd.exec(ctx),
            Command::DecrBy(cmd) => cmd.exec(ctx),
            Command::Del(cmd) => cmd.exec(ctx),
            Command::Echo(cmd) => cmd.exec(ctx),
            Command::Exists(cmd) => cmd.exec(ctx),
            Command::Expire(cmd) => cmd.exec(ctx),
            Command::Get(cmd) => cmd.exec(ctx),
            Command::Hdel(cmd) => cmd.exec(ctx),
            Command::Hget(cmd) => cmd.exec(ctx),
            Command::HgetAll(cmd) => cmd.exec(ctx),
            Command::Hlen(cmd) => cmd.exec(ctx),
            Command::Hset(cmd) => cmd.exec(ctx),
            Command::Incr(cmd) => cmd.exec(ctx),
            Command::IncrBy(cmd) => cmd.exec(ctx),
            Command::Info(cmd) => cmd.exec(ctx),
            Command::Llen(cmd) => cmd.exec(ctx),
            Command::Lpop(cmd) => cmd.exec(ctx),
            Command::Lpush(cmd) => cmd.exec(ctx),
            Command::Lrange(cmd) => cmd.exec(ctx),
            Command::Mget(cmd) => cmd.exec(ctx),
            Command::Mset(cmd) => cmd.exec(ctx),
            Command::Ping(cmd) => cmd.exec(ctx),
            Command::Publish(cmd) => cmd.exec(ctx),
            Command::Quit(cmd) => cmd.exec(ctx),
            Command::Rpop(cmd) => cmd.exec(ctx),
            Command::Rpush(cmd) => cmd.exec(ctx),
            Command::Sadd(cmd) => cmd.exec(ctx),
            Command::Save(cmd) => cmd.exec(ctx),
            Command::Scard(cmd) => cmd.exec(ctx),
            Command::Set(cmd) => cmd.exec(ctx),
            Command::Setex(cmd) => cmd.exec(ctx),
            Command::Setnx(cmd) => cmd.exec(ctx),
            Command::Smembers(cmd) => cmd.exec(ctx),
            Command::Srem(cmd) => cmd.exec(ctx),
            Command::Strlen(cmd) => cmd.exec(ctx),
            Command::Subscribe(cmd) => cmd.exec(ctx),
            Command::Ttl(cmd) => cmd.exec(ctx),
            Command::Type(cmd) => cmd.exec(ctx),
            Command::Unsubscribe(cmd) => cmd.exec(ctx),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let argc = frames.len();
        let parser = &mut CommandParser {
            name: String::new(),
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        let arity = arity(&command_name).ok_or_else(|| CommandParserError::UnknownCommand {
            command: command_name.clone(),
        })?;
        if !arity.accepts(argc) {
            return Err(parser.wrong_arity().into());
        }

        match &command_name[..] {
            "append" => Append::try_from(parser).map(Command::Append),
            "auth" => Auth::try_from(parser).map(Command::Auth),
            "bgsave" => BgSave::try_from(parser).map(Command::BgSave),
            "client" => Client::try_from(parser).map(Command::Client),
            "config" => Config::try_from(parser).map(Command::Config),
            "decr" => Decr::try_from(parser).map(Command::Decr),
            "decrby" => DecrBy::try_from(parser).map(Command::DecrBy),
            "del" => Del::try_from(parser).map(Command::Del),
            "echo" => Echo::try_from(parser).map(Command::Echo),
            "exists" => Exists::try_from(parser).map(Command::Exists),
            "expire" => Expire::try_from(parser).map(Command::Expire),
            "get" => Get::try_from(parser).map(Command::Get),
            "hdel" => Hdel::try_from(parser).map(Command::Hdel),
            "hget" => Hget::try_from(parser).map(Command::Hget),
            "hgetall" => HgetAll::try_from(parser).map(Command::HgetAll),
            "hlen" => Hlen::try_from(parser).map(Command::Hlen),
            "hset" => Hset::try_from(parser).map(Command::Hset),
            "incr" => Incr::try_from(parser).map(Command::Incr),
            "incrby" => IncrBy::try_from(parser).map(Command::IncrBy),
            "info" => Info::try_from(parser).map(Command::Info),
            "llen" => Llen::try_from(parser).map(Command::Llen),
            "lpop" => Lpop::try_from(parser).map(Command::Lpop),
            "lpush" => Lpush::try_from(parser).map(Command::Lpush),
            "lrange" => Lrange::try_from(parser).map(Command::Lrange),
            "mget" => Mget::try_from(parser).map(Command::Mget),
            "mset" => Mset::try_from(parser).map(Command::Mset),
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "publish" => Publish::try_from(parser).map(Command::Publish),
            "quit" => Quit::try_from(parser).map(Command::Quit),
            "rpop" => Rpop::try_from(parser).map(Command::Rpop),
            "rpush" => Rpush::try_from(parser).map(Command::Rpush),
            "sadd" => Sadd::try_from(parser).map(Command::Sadd),
            "save" => Save::try_from(parser).map(Command::Save),
            "scard" => Scard::try_from(parser).map(Command::Scard),
            "set" => Set::try_from(parser).map(Command::Set),
            "setex" => Setex::try_from(parser).map(Command::Setex),
            "setnx" => Setnx::try_from(parser).map(Command::Setnx),
            "smembers" => Smembers::try_from(parser).map(Command::Smembers),
            "srem" => Srem::try_from(parser).map(Command::Srem),
            "strlen" => Strlen::try_from(parser).map(Command::Strlen),
            "subscribe" => Subscribe::try_from(parser).map(Command::Subscribe),
            "ttl" => Ttl::try_from(parser).map(Command::Ttl),
            "type" => Type::try_from(parser).map(Command::Type),
            "unsubscribe" => Unsubscribe::try_from(parser).map(Command::Unsubscribe),
            _ => Err(CommandParserError::UnknownCommand {
                command: command_name,
            }
            .into()),
        }
    }
}

/// Accepted argument counts, including the command name itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    fn accepts(self, argc: usize) -> bool {
        match self {
            Arity::Exact(n) => argc == n,
            Arity::AtLeast(n) => argc >= n,
            Arity::Between(min, max) => (min..=max).contains(&argc),
        }
    }
}

fn arity(command: &str) -> Option<Arity> {
    use Arity::*;

    let arity = match command {
        "append" => AtLeast(3),
        "auth" => Exact(2),
        "bgsave" => Exact(1),
        "client" => AtLeast(2),
        "config" => AtLeast(2),
        "decr" => Exact(2),
        "decrby" => AtLeast(3),
        "del" => AtLeast(2),
        "echo" => Exact(2),
        "exists" => AtLeast(2),
        "expire" => Exact(3),
        "get" => Exact(2),
        "hdel" => AtLeast(3),
        "hget" => Exact(3),
        "hgetall" => Exact(2),
        "hlen" => Exact(2),
        "hset" => AtLeast(3),
        "incr" => Exact(2),
        "incrby" => AtLeast(3),
        "info" => Between(1, 2),
        "llen" => Exact(2),
        "lpop" => Between(2, 3),
        "lpush" => AtLeast(3),
        "lrange" => Exact(4),
        "mget" => AtLeast(2),
        "mset" => AtLeast(5),
        "ping" => Between(1, 2),
        "publish" => AtLeast(3),
        "quit" => AtLeast(1),
        "rpop" => Between(2, 3),
        "rpush" => AtLeast(3),
        "sadd" => AtLeast(2),
        "save" => Exact(1),
        "scard" => Exact(2),
        "set" => AtLeast(3),
        "setex" => AtLeast(4),
        "setnx" => AtLeast(3),
        "smembers" => Exact(2),
        "srem" => AtLeast(2),
        "strlen" => Exact(2),
        "subscribe" => AtLeast(2),
        "ttl" => Exact(2),
        "type" => Exact(2),
        "unsubscribe" => AtLeast(2),
        _ => return None,
    };

    Some(arity)
}

pub struct CommandParser {
    name: String,
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        let name = match command_name {
            Frame::Simple(s) => s.to_lowercase(),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String)?,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "simple string".to_string(),
                    actual: frame,
                })
            }
        };

        self.name = name.clone();
        Ok(name)
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Integer(i) => Ok(i),
            Frame::Simple(string) => string
                .parse::<i64>()
                .map_err(|_| CommandParserError::NotAnInteger),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or(CommandParserError::NotAnInteger),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "integer".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings. Strings are parsed to UTF-8.
            // While errors are stored as strings, they are considered separate types.
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn remaining(&self) -> usize {
        self.parts.len()
    }

    /// Consumes every remaining argument as a string.
    fn rest_strings(&mut self) -> Result<Vec<String>, CommandParserError> {
        let mut strings = Vec::with_capacity(self.parts.len());
        while self.remaining() > 0 {
            strings.push(self.next_string()?);
        }
        Ok(strings)
    }

    /// Consumes every remaining argument as raw bytes.
    fn rest_bytes(&mut self) -> Result<Vec<Bytes>, CommandParserError> {
        let mut values = Vec::with_capacity(self.parts.len());
        while self.remaining() > 0 {
            values.push(self.next_bytes()?);
        }
        Ok(values)
    }

    /// Consumes every remaining argument and joins them with single spaces. Values written this
    /// way survive the space-separated append-only log.
    fn rest_joined(&mut self) -> Result<Bytes, CommandParserError> {
        let parts = self.rest_bytes()?;
        if parts.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        let mut joined = BytesMut::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                joined.extend_from_slice(b" ");
            }
            joined.extend_from_slice(part);
        }
        Ok(joined.freeze())
    }

    fn invalid_syntax(&self) -> CommandParserError {
        CommandParserError::InvalidSyntax {
            command: self.name.to_uppercase(),
        }
    }

    fn wrong_arity(&self) -> CommandParserError {
        CommandParserError::WrongArity {
            command: self.name.clone(),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("ERR unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("ERR invalid {command} syntax")]
    InvalidSyntax { command: String },
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is out of range, must be positive")]
    NotPositive,
    #[error("ERR invalid expiration time")]
    InvalidExpireTime,
    #[error("ERR protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("ERR protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

/// Largest accepted expiration, in seconds. Keeps deadlines representable in milliseconds.
const MAX_EXPIRE_SECS: u64 = i64::MAX as u64 / 1000;

/// Parses an expiration argument: a non-negative number of seconds.
fn parse_seconds(parser: &mut CommandParser) -> Result<u64, CommandParserError> {
    parser
        .next_string()?
        .parse::<u64>()
        .ok()
        .filter(|seconds| *seconds <= MAX_EXPIRE_SECS)
        .ok_or(CommandParserError::InvalidExpireTime)
}
