use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use strata_server::{ServerConfig, StrataServer};

#[derive(Parser)]
#[command(
    name = "strata-serve",
    about = "Host a Strata repository over HTTP",
    version
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Serve a shallow clone of this depth
    #[arg(long)]
    shallow_depth: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if cli.shallow_depth.is_some() {
        config.shallow_depth = cli.shallow_depth;
    }

    StrataServer::new(config).serve().await?;
    Ok(())
}
