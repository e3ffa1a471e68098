#![forbid(unsafe_code)]
//! HTTP front end for a single in-process ledger.

use clap::Parser;
use hashledger::api::{run_server, Node};
use hashledger::blockchain::Ledger;
use hashledger::config::{load_config, DEFAULT_CONFIG_PATH};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hashledger-server", version, about = "Serve a proof-of-work ledger over HTTP")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the mining difficulty (leading zero hex characters)
    #[arg(short, long)]
    difficulty: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hashledger=info,mining=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(difficulty) = args.difficulty {
        config.ledger.difficulty = difficulty;
    }
    config.validate()?;

    let ledger = Ledger::new(config.ledger.difficulty)?;
    tracing::info!(
        difficulty = ledger.difficulty(),
        genesis = %ledger.latest_block().hash,
        "ledger initialised"
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    run_server(Arc::new(Node::new(ledger)), addr).await
}
