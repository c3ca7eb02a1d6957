//! Terminal renderer for panel updates.

use crate::OutputFormat;
use colored::*;
use serde_json::json;
use wxfeed::display::MISSING_CLOCK;
use wxfeed::{Channel, LabelUpdate, ReadingUpdate, RenderSink, ScaleMode, SeriesUpdate};

pub struct TerminalSink {
    format: OutputFormat,
    /// Print a line for every plot update, not only for readings
    show_series: bool,
}

impl TerminalSink {
    pub fn new(format: OutputFormat, show_series: bool) -> Self {
        Self {
            format,
            show_series,
        }
    }
}

impl RenderSink for TerminalSink {
    fn on_reading(&mut self, update: &ReadingUpdate) {
        println!("{}", reading_line(update, self.format));
    }

    fn on_series(&mut self, update: &SeriesUpdate) {
        if self.show_series || self.format == OutputFormat::Json {
            println!("{}", series_line(update, self.format));
        }
    }

    fn on_disconnected(&mut self, channel: &Channel, placeholders: &[LabelUpdate]) {
        println!("{}", disconnected_line(channel, placeholders, self.format));
    }
}

fn labels_text(labels: &[LabelUpdate]) -> String {
    labels
        .iter()
        .map(|l| format!("{} {}", l.label.dimmed(), l.text.bold()))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn reading_line(update: &ReadingUpdate, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({
            "event": "reading",
            "channel": update.channel,
            "ts": update.ts,
            "clock": update.clock,
            "labels": update
                .labels
                .iter()
                .map(|l| json!({ "metric": l.metric, "text": l.text }))
                .collect::<Vec<_>>(),
        })
        .to_string(),
        OutputFormat::Table => format!(
            "{} {}  {}",
            format!("[{}]", update.clock).cyan(),
            update.channel.as_str().blue(),
            labels_text(&update.labels)
        ),
    }
}

pub fn series_line(update: &SeriesUpdate, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({
            "event": "series",
            "channel": update.channel,
            "metric": update.metric,
            "revision": update.revision,
            "scale": update.scale,
            "window": update.window_label,
            "points": update.points,
        })
        .to_string(),
        OutputFormat::Table => {
            let latest = update
                .points
                .last()
                .map(|(_, y)| y.to_string())
                .unwrap_or_else(|| "-".to_string());
            let scale = match update.scale {
                ScaleMode::Linear => update.scale.to_string().normal(),
                ScaleMode::Logarithmic => update.scale.to_string().magenta(),
            };
            format!(
                "    {} {} points {} latest {} [{}] r{}",
                update.metric.as_str().green(),
                update.points.len(),
                update.window_label,
                latest,
                scale,
                update.revision
            )
        }
    }
}

pub fn disconnected_line(
    channel: &Channel,
    placeholders: &[LabelUpdate],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => json!({
            "event": "disconnected",
            "channel": channel,
            "labels": placeholders
                .iter()
                .map(|l| json!({ "metric": l.metric, "text": l.text }))
                .collect::<Vec<_>>(),
        })
        .to_string(),
        OutputFormat::Table => format!(
            "{} {} {}  {}",
            "✗".red(),
            format!("[{}]", MISSING_CLOCK).cyan(),
            channel.as_str().red(),
            labels_text(placeholders)
        ),
    }
}
