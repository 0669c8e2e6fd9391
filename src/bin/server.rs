use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zedis::config::Config;
use zedis::{server, Error};

#[derive(Parser, Debug)]
#[command(version, about = "An in-memory key-value server speaking RESP")]
struct Args {
    /// Path to the `key value` config file. Created on the first CONFIG SET if missing.
    #[arg(short, long, env = "ZEDIS_CONFIG", default_value = "zedis.conf")]
    config: PathBuf,

    /// The port to listen on, overriding the config file for this run
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)?;
    if let Some(port) = args.port {
        config.set_override("port", &port.to_string());
    }

    server::run(config).await
}
