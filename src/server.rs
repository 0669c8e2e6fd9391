use bytes::Bytes;
use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, instrument, warn};

use crate::commands::auth::Auth;
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::context::Context;
use crate::frame::Frame;
use crate::pubsub::Sink;
use crate::Error;

const NOAUTH: &str = "NOAUTH Authentication required.";
const SUBSCRIBER_MODE: &str =
    "ERR only SUBSCRIBE / UNSUBSCRIBE / PING / QUIT are allowed in this context";

/// Loads persisted state (when enabled), binds the listener and serves clients until the accept
/// loop fails.
pub async fn run(config: Config) -> Result<(), Error> {
    let ctx = Context::bootstrap(config)?;

    let bind = ctx.config.bind();
    let listener = TcpListener::bind((bind.as_str(), ctx.config.port())).await?;

    serve(listener, ctx).await
}

/// Accepts connections on `listener`, one task per client.
pub async fn serve(listener: TcpListener, ctx: Context) -> Result<(), Error> {
    info!("Zedis server listening on {}", listener.local_addr()?);

    loop {
        let (socket, client_address) = listener.accept().await?;
        let ctx = ctx.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, ctx).await {
                error!(cause = %e, "connection failed");
            }
        });
    }
}

/// Per-connection state that lives as long as the socket.
struct Client {
    id: u64,
    authenticated: bool,
    subscriptions: HashSet<String>,
    sink: Sink,
}

#[instrument(
    name = "connection",
    skip(stream, ctx),
    fields(client_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    ctx: Context,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream);

    let authenticated = ctx.config.requirepass().is_none();
    let session = ctx
        .sessions
        .register(client_address.to_string(), authenticated);

    tracing::Span::current()
        .record("client_id", session.id())
        .record("client_address", client_address.to_string());

    let (sink, mut messages) = mpsc::unbounded_channel();
    let mut client = Client {
        id: session.id(),
        authenticated,
        subscriptions: HashSet::new(),
        sink,
    };

    let res = serve_client(&mut conn, &ctx, &mut client, &mut messages).await;

    ctx.pubsub.unsubscribe_all(client.id);
    info!("Connection closed");
    res
}

async fn serve_client(
    conn: &mut Connection,
    ctx: &Context,
    client: &mut Client,
    messages: &mut UnboundedReceiver<Frame>,
) -> Result<(), Error> {
    loop {
        let frame = tokio::select! {
            frame = conn.read_frame() => frame,
            Some(message) = messages.recv() => {
                conn.write_frame(message).await?;
                continue;
            }
        };

        let frame = match frame {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(()),
            Err(e) if e.downcast_ref::<io::Error>().is_some() => return Err(e),
            Err(e) => {
                warn!(cause = %e, "protocol error, closing connection");
                // Best effort: the peer may already be gone.
                let _ = conn
                    .write_frame(Frame::Error(format!("ERR Protocol error: {e}")))
                    .await;
                return Ok(());
            }
        };

        for reply in handle_request(frame, ctx, client).await {
            match reply {
                Reply::Frame(frame) => conn.write_frame(frame).await?,
                Reply::Quit(frame) => {
                    conn.write_frame(frame).await?;
                    return Ok(());
                }
            }
        }
    }
}

enum Reply {
    Frame(Frame),
    /// Written before the connection is closed.
    Quit(Frame),
}

async fn handle_request(frame: Frame, ctx: &Context, client: &mut Client) -> Vec<Reply> {
    let args = arguments(&frame);
    let Some(name) = args.first() else {
        return vec![];
    };
    let name = String::from_utf8_lossy(name).to_lowercase();

    if !client.authenticated && name != "auth" && name != "ping" {
        return vec![Reply::Frame(Frame::Error(NOAUTH.to_string()))];
    }

    if !client.subscriptions.is_empty()
        && !matches!(
            name.as_str(),
            "subscribe" | "unsubscribe" | "ping" | "quit"
        )
    {
        return vec![Reply::Frame(Frame::Error(SUBSCRIBER_MODE.to_string()))];
    }

    debug!(command = %name, argc = args.len(), "executing command");

    let cmd = match Command::try_from(frame) {
        Ok(cmd) => cmd,
        Err(e) => {
            ctx.persistence.record(&args, || ());
            return vec![Reply::Frame(Frame::Error(e.to_string()))];
        }
    };

    ctx.sessions.touch(client.id);

    let replies = match cmd {
        Command::Auth(auth) => {
            let res = auth.verify_off_thread(ctx).await;
            if res.is_ok() {
                client.authenticated = true;
                ctx.sessions
                    .update(client.id, |session| session.authenticated = true);
            }
            vec![Auth::reply(res)]
        }
        Command::Subscribe(subscribe) => {
            let acks = subscribe.apply(ctx, client.id, &client.sink, &mut client.subscriptions);
            update_subscriptions(ctx, client);
            acks
        }
        Command::Unsubscribe(unsubscribe) => {
            let acks = unsubscribe.apply(ctx, client.id, &mut client.subscriptions);
            update_subscriptions(ctx, client);
            acks
        }
        Command::Quit(quit) => {
            let reply = quit.exec(ctx).unwrap_or_else(error_reply);
            return vec![Reply::Quit(reply)];
        }
        Command::Client(cmd) => vec![cmd.exec_for(ctx, client.id)],
        Command::Config(cmd) => {
            let res = cmd.hash_credentials().await.and_then(|cmd| cmd.exec(ctx));
            vec![res.unwrap_or_else(error_reply)]
        }
        cmd => {
            let res = ctx.persistence.record(&args, || cmd.exec(ctx));
            vec![res.unwrap_or_else(error_reply)]
        }
    };

    replies.into_iter().map(Reply::Frame).collect()
}

fn update_subscriptions(ctx: &Context, client: &Client) {
    let count = client.subscriptions.len();
    ctx.sessions
        .update(client.id, |session| session.subscriptions = count);
}

fn error_reply(e: Error) -> Frame {
    Frame::Error(format!("ERR {e}"))
}

/// The raw request arguments, as written to the append-only log.
fn arguments(frame: &Frame) -> Vec<Bytes> {
    match frame {
        Frame::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Frame::Bulk(bytes) => Some(bytes.clone()),
                Frame::Simple(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}
