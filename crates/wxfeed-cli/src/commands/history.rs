//! Fetch and print one metric's backfill.

use crate::commands::{credentials, feed_config};
use crate::output::OutputDisplay;
use crate::Cli;
use anyhow::Result;
use chrono::{Local, TimeZone};
use serde::Serialize;
use tabled::Tabled;
use wxfeed::scale::select_scale_values;
use wxfeed::{Channel, HistoryWindow};
use wxfeed_client::{ApiClient, HistoryClient};

#[derive(clap::Args, Clone)]
pub struct HistoryArgs {
    /// Channel, e.g. zero:sensor:BME280
    pub channel: String,

    /// Metric inside the channel's records, e.g. pressure
    pub metric: String,

    /// Minutes of history (1-2160)
    #[arg(long)]
    pub back: Option<u64>,

    /// Seconds between samples (10 to back*30)
    #[arg(long)]
    pub cadence: Option<u64>,

    /// Show only the newest N samples
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Tabled, Serialize)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Timestamp")]
    ts: f64,
    #[tabled(rename = "Value")]
    value: f64,
}

pub async fn execute(args: HistoryArgs, cli: &Cli) -> Result<()> {
    let config = feed_config(cli)?;
    let api = ApiClient::try_new(&config.client_config(), credentials(cli)?)?;
    let history = HistoryClient::from_api(api);

    let window = HistoryWindow::clamped(args.back, args.cadence, None);
    let query = window.query(&Channel::from(args.channel.as_str()), &args.metric);

    // Surface failures here instead of degrading to an empty list
    let mut samples = history.try_fetch(&query).await?;
    if let Some(limit) = args.limit {
        let skip = samples.len().saturating_sub(limit);
        samples.drain(..skip);
    }

    if cli.format == crate::OutputFormat::Table && !samples.is_empty() {
        crate::output::info(&format!(
            "{} samples of {}:{} over {} minutes every {}s, {} scale",
            samples.len(),
            args.channel,
            args.metric,
            window.back_minutes,
            window.cadence_secs,
            select_scale_values(samples.iter().map(|s| s.value)),
        ));
    }

    let rows: Vec<HistoryRow> = samples
        .iter()
        .map(|s| HistoryRow {
            time: format_time(s.ts),
            ts: s.ts,
            value: s.value,
        })
        .collect();

    rows.display(cli)
}

fn format_time(ts: f64) -> String {
    Local
        .timestamp_opt(ts as i64, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
