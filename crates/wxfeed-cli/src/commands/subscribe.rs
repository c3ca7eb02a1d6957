//! Subscribe command: print a channel's live records as they arrive.

use crate::commands::{credentials, feed_config};
use crate::output;
use crate::{Cli, OutputFormat};
use anyhow::Result;
use futures::StreamExt;
use wxfeed::display::clock_label;
use wxfeed::{FeedEvent, Record};
use wxfeed_client::{ApiClient, Subscriber, SubscriptionState};

#[derive(clap::Args, Clone)]
pub struct SubscribeArgs {
    /// Channel to subscribe to
    pub channel: String,

    /// Exit after this many records
    #[arg(short = 'n', long)]
    pub count: Option<u64>,

    /// Exit on the first disconnect instead of reconnecting
    #[arg(long)]
    pub once: bool,

    /// Show only data (skip disconnect messages)
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(args: SubscribeArgs, cli: &Cli) -> Result<()> {
    let config = feed_config(cli)?;
    let client_config = config.client_config();
    let api = ApiClient::try_new(&client_config, credentials(cli)?)?;
    let subscriber = Subscriber::from_api(api, client_config.backoff);
    let mut feed = subscriber.subscribe(args.channel.as_str().into(), Default::default());

    if !args.quiet && cli.format == OutputFormat::Table {
        output::info(&format!("Subscribing to {}", args.channel));
    }

    let mut received = 0u64;
    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = feed.next() => event,
        };

        match event {
            Some(FeedEvent::Data(record)) => {
                if received == 0 && !args.quiet && cli.format == OutputFormat::Table {
                    output::success(&format!("Streaming ({})", feed.state()));
                }
                print_record(&record, cli.format)?;
                received += 1;
                if args.count.is_some_and(|n| received >= n) {
                    break;
                }
            }
            Some(FeedEvent::Closed) => {
                if !args.quiet && cli.format == OutputFormat::Table {
                    output::warning(&format!("{} disconnected", args.channel));
                }
                if args.once {
                    break;
                }
            }
            None => break,
        }
    }

    feed.cancel();
    if !args.quiet && cli.format == OutputFormat::Table {
        let state = feed.state();
        if state != SubscriptionState::Streaming {
            output::info(&format!("Stopped while {}", state));
        }
        output::info(&format!("{} records received", received));
    }
    Ok(())
}

fn print_record(record: &Record, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(record)?),
        OutputFormat::Table => {
            let values: Vec<String> = record
                .value
                .iter()
                .map(|(metric, value)| format!("{}={}", metric, value))
                .collect();
            println!("[{}] {}", clock_label(record.ts), values.join(" "));
        }
    }
    Ok(())
}
