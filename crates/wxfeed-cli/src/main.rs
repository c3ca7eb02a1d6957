use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;
use wxfeed_metrics::MetricsServer;

mod commands;
mod output;
mod render;

use commands::*;

#[derive(Parser)]
#[command(
    name = "wxfeed",
    about = "wxfeed - live sensor feeds in the terminal",
    version = "0.1.0",
    long_about = None
)]
pub struct Cli {
    /// Host the dashboard is served from; endpoints are derived from it
    #[arg(long, env = "WXFEED_HOST", default_value = "localhost", global = true)]
    pub host: String,

    /// Override the HTTP API base URL
    #[arg(long, env = "WXFEED_HTTP_BASE", global = true)]
    pub http_base: Option<String>,

    /// Override the websocket base URL
    #[arg(long, env = "WXFEED_WS_BASE", global = true)]
    pub ws_base: Option<String>,

    /// Base64 `user:password`, sent as HTTP Basic credentials
    #[arg(long, env = "WXFEED_AUTH", hide_env_values = true, global = true)]
    pub auth: Option<String>,

    /// User name (with --password) when --auth is not given
    #[arg(long, env = "WXFEED_USER", global = true)]
    pub user: Option<String>,

    #[arg(long, env = "WXFEED_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// JSON feed config with endpoint settings and panel definitions
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch historical samples for one metric
    History(history::HistoryArgs),

    /// Print raw records from a live channel
    Subscribe(subscribe::SubscribeArgs),

    /// Run the dashboard panels: backfill, then live updates
    Watch(watch::WatchArgs),
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(addr) = cli.metrics_addr {
        let server = MetricsServer::new(addr);
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!(error = %e, "Metrics server failed");
            }
        });
    }

    match &cli.command {
        Commands::History(args) => history::execute(args.clone(), &cli).await,
        Commands::Subscribe(args) => subscribe::execute(args.clone(), &cli).await,
        Commands::Watch(args) => watch::execute(args.clone(), &cli).await,
    }
}
