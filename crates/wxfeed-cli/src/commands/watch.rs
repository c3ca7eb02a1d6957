//! Watch command: run every configured panel until interrupted.
//!
//! Panels are grouped by channel and each group gets its own task: backfill,
//! then one live subscription from the shared registry fanned out to every
//! panel of the group, rendered to the terminal.

use crate::commands::{credentials, feed_config};
use crate::output;
use crate::render::TerminalSink;
use crate::{Cli, OutputFormat};
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};
use wxfeed::{FeedConfig, HistoryWindow, Panel, PanelGroup};
use wxfeed_client::{ApiClient, HistoryClient, Subscriber, SubscriptionRegistry};

#[derive(clap::Args, Clone)]
pub struct WatchArgs {
    /// Minutes of history to plot (1-2160)
    #[arg(long)]
    pub back: Option<u64>,

    /// Seconds between plotted samples (10 to back*30)
    #[arg(long)]
    pub cadence: Option<u64>,

    /// How many history windows the live plots retain (1-5)
    #[arg(long)]
    pub multiplier: Option<u64>,

    /// Also show the particulate (PM2.5) panel
    #[arg(long, alias = "pm")]
    pub particulate: bool,

    /// Print plot updates as well as readings
    #[arg(long)]
    pub plots: bool,
}

pub async fn execute(args: WatchArgs, cli: &Cli) -> Result<()> {
    let mut config = feed_config(cli)?;
    if cli.config.is_none() {
        let window = HistoryWindow::clamped(args.back, args.cadence, args.multiplier);
        config.panels = FeedConfig::default_panels(window, args.particulate);
    }
    if config.panels.is_empty() {
        output::warning("No panels configured");
        return Ok(());
    }

    let api = ApiClient::try_new(&config.client_config(), credentials(cli)?)?;
    let history = HistoryClient::from_api(api.clone());
    let registry = Arc::new(SubscriptionRegistry::new(Subscriber::from_api(
        api,
        config.client_config().backoff,
    )));

    let http_base = config.endpoints().http_base;
    let mut panels = Vec::with_capacity(config.panels.len());
    for panel_config in config.panels {
        panels.push(Panel::new(panel_config)?);
    }
    let panel_count = panels.len();
    let groups = PanelGroup::by_channel(panels);

    if cli.format == OutputFormat::Table {
        output::info(&format!(
            "Watching {} panel(s) on {} channel(s) via {}",
            panel_count,
            groups.len(),
            http_base
        ));
    }

    let mut tasks = JoinSet::new();
    for mut group in groups {
        let history = history.clone();
        let registry = registry.clone();
        let mut sink = TerminalSink::new(cli.format, args.plots);

        tasks.spawn(async move {
            // Backfill failures are absorbed; only a double seed can error here
            if let Err(e) = group.seed(&history).await {
                output::error(&format!("{}: {}", group.channel(), e));
            }
            let subscription = registry.subscribe(group.channel().clone());
            let received = group.run(subscription, &mut sink).await;
            debug!(channel = %group.channel(), records = received, "Channel task finished");
        });
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down subscriptions");
        }
        _ = async { while tasks.join_next().await.is_some() {} } => {}
    }

    registry.shutdown();
    while tasks.join_next().await.is_some() {}

    if cli.format == OutputFormat::Table {
        output::success("Stopped");
    }
    Ok(())
}
