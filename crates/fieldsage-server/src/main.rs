//! Fieldsage server CLI
//!
//! Starts the HTTP server that answers recommendation requests.

use anyhow::Context;
use clap::Parser;
use fieldsage_server::{config::ServerConfig, start_server};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Fieldsage - field value recommendations for catalog forms
#[derive(Debug, Parser)]
#[command(name = "fieldsage-server", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "FIELDSAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind address (e.g. 0.0.0.0:8787)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            eprintln!("Warning: No config file specified, using local defaults");
            ServerConfig::default_local()
        }
    };
    config.apply_env();

    if let Some(bind) = cli.bind {
        let (address, port) = bind
            .rsplit_once(':')
            .context("--bind expects <address>:<port>")?;
        config.bind_address = address.to_string();
        config.bind_port = port
            .parse()
            .with_context(|| format!("invalid port in --bind: {}", port))?;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log_level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    start_server(config).await?;

    Ok(())
}
