//! Channel panels: the pipeline from feed events to renderer updates.
//!
//! A [`Panel`] owns one buffer per configured metric. For every live record
//! it refreshes the reading labels, offers each metric value to its buffer
//! and, when the buffer accepts it, pushes the new plot points together with
//! the recomputed axis scale to a [`RenderSink`].

use crate::config::{HistoryWindow, MetricConfig, PanelConfig};
use crate::display;
use crate::error::{Result, WxError};
use crate::series::{Appended, Series};
use futures::{Stream, StreamExt};
use tracing::{debug, info};
use wxfeed_client::HistoryClient;
use wxfeed_types::{Channel, FeedEvent, Record, Sample, ScaleMode};

/// Text for one metric's value label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelUpdate {
    pub metric: String,
    pub label: String,
    pub text: String,
}

/// Label refresh for a received record. Emitted for every record, whether or
/// not any buffer accepted it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingUpdate {
    pub channel: Channel,
    pub ts: f64,
    pub clock: String,
    pub labels: Vec<LabelUpdate>,
}

/// New contents of one metric's plot.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesUpdate {
    pub channel: Channel,
    pub metric: String,
    pub points: Vec<(f64, f64)>,
    pub scale: ScaleMode,
    pub window_label: String,
    /// Bumped on every change to any of the panel's plots
    pub revision: u64,
}

/// Consumer of panel output.
pub trait RenderSink {
    fn on_reading(&mut self, update: &ReadingUpdate);

    fn on_series(&mut self, update: &SeriesUpdate);

    /// The channel's stream closed; show `placeholders` until data returns.
    fn on_disconnected(&mut self, channel: &Channel, placeholders: &[LabelUpdate]);
}

impl<S: RenderSink + ?Sized> RenderSink for &mut S {
    fn on_reading(&mut self, update: &ReadingUpdate) {
        (**self).on_reading(update)
    }

    fn on_series(&mut self, update: &SeriesUpdate) {
        (**self).on_series(update)
    }

    fn on_disconnected(&mut self, channel: &Channel, placeholders: &[LabelUpdate]) {
        (**self).on_disconnected(channel, placeholders)
    }
}

struct MetricSeries {
    metric: MetricConfig,
    series: Series,
}

pub struct Panel {
    channel: Channel,
    history: Option<HistoryWindow>,
    metrics: Vec<MetricSeries>,
    revision: u64,
}

impl Panel {
    pub fn new(config: PanelConfig) -> Result<Self> {
        config.validate()?;

        let mut metrics = Vec::with_capacity(config.metrics.len());
        for metric in config.metrics {
            let mut series = Series::new(config.policy)?.with_origin(config.origin);
            if let Some(cadence) = config.cadence_secs {
                series = series.with_cadence(cadence);
            }
            metrics.push(MetricSeries { metric, series });
        }

        Ok(Self {
            channel: config.channel,
            history: config.history,
            metrics,
            revision: 0,
        })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn series(&self, metric: &str) -> Option<&Series> {
        self.metrics
            .iter()
            .find(|m| m.metric.name == metric)
            .map(|m| &m.series)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|m| m.metric.name.as_str())
    }

    /// Fetch backfill for every metric and seed the buffers with it.
    ///
    /// Panels without a history window are left empty. Fetch failures leave
    /// the affected buffer empty. Returns the number of samples seeded.
    pub async fn seed(&mut self, history: &HistoryClient) -> Result<usize> {
        let Some(window) = self.history else {
            return Ok(0);
        };

        let mut total = 0;
        for index in 0..self.metrics.len() {
            let query = window.query(&self.channel, &self.metrics[index].metric.name);
            let samples = history.fetch_history(&query).await;
            total += self.seed_index(index, samples)?;
        }

        info!(channel = %self.channel, samples = total, "Panel seeded");
        Ok(total)
    }

    /// Seed one metric's buffer from already-fetched ascending samples.
    pub fn seed_with(&mut self, metric: &str, samples: Vec<Sample>) -> Result<usize> {
        let index = self
            .metrics
            .iter()
            .position(|m| m.metric.name == metric)
            .ok_or_else(|| {
                WxError::Config(format!("panel {} has no metric {}", self.channel, metric))
            })?;
        self.seed_index(index, samples)
    }

    fn seed_index(&mut self, index: usize, samples: Vec<Sample>) -> Result<usize> {
        let entry = &mut self.metrics[index];
        let seeded = entry.series.seed(samples)?;
        if seeded > 0 {
            self.revision += 1;
            self.record_points(index);
        }
        Ok(seeded)
    }

    /// Push every non-empty plot to the sink.
    pub fn publish<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        for index in 0..self.metrics.len() {
            if !self.metrics[index].series.is_empty() {
                sink.on_series(&self.series_update(index));
            }
        }
    }

    /// Apply one live record. Returns how many metric samples were accepted.
    pub fn apply<S: RenderSink + ?Sized>(&mut self, record: &Record, sink: &mut S) -> usize {
        let labels = self
            .metrics
            .iter()
            .filter_map(|m| {
                record.metric(&m.metric.name).map(|value| LabelUpdate {
                    metric: m.metric.name.clone(),
                    label: m.metric.label.clone(),
                    text: m.metric.format(value),
                })
            })
            .collect();

        sink.on_reading(&ReadingUpdate {
            channel: self.channel.clone(),
            ts: record.ts,
            clock: display::clock_label(record.ts),
            labels,
        });

        let mut accepted = 0;
        for index in 0..self.metrics.len() {
            let entry = &self.metrics[index];
            let Some(value) = record.metric(&entry.metric.name) else {
                continue;
            };
            let value = entry.metric.plot_value(value);

            match self.metrics[index].series.append(record.ts, value) {
                Appended::Accepted => {
                    accepted += 1;
                    self.revision += 1;
                    self.record_points(index);
                    sink.on_series(&self.series_update(index));
                }
                Appended::Throttled => {
                    debug!(
                        channel = %self.channel,
                        metric = %self.metrics[index].metric.name,
                        ts = record.ts,
                        "Sample throttled by cadence"
                    );
                    #[cfg(feature = "metrics")]
                    wxfeed_metrics::SAMPLES_THROTTLED
                        .with_label_values(&[
                            self.channel.as_str(),
                            self.metrics[index].metric.name.as_str(),
                        ])
                        .inc();
                }
                Appended::Stale => {
                    debug!(
                        channel = %self.channel,
                        metric = %self.metrics[index].metric.name,
                        ts = record.ts,
                        "Dropping out-of-order sample"
                    );
                }
            }
        }

        accepted
    }

    /// Labels to show while the channel is down.
    pub fn placeholders(&self) -> Vec<LabelUpdate> {
        self.metrics
            .iter()
            .map(|m| LabelUpdate {
                metric: m.metric.name.clone(),
                label: m.metric.label.clone(),
                text: m.metric.placeholder.clone(),
            })
            .collect()
    }

    pub fn disconnect<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        info!(channel = %self.channel, "Channel disconnected");
        sink.on_disconnected(&self.channel, &self.placeholders());
    }

    /// Drive the panel from a feed until the feed ends.
    ///
    /// Seeded plots are published first. Returns the number of records applied.
    pub async fn run<St, S>(&mut self, mut events: St, sink: &mut S) -> u64
    where
        St: Stream<Item = FeedEvent> + Unpin,
        S: RenderSink + ?Sized,
    {
        self.publish(sink);

        let mut applied = 0;
        while let Some(event) = events.next().await {
            if self.handle(&event, sink) {
                applied += 1;
            }
        }

        debug!(channel = %self.channel, records = applied, "Panel feed ended");
        applied
    }

    /// Apply one feed event. Returns true when it carried a record.
    pub fn handle<S: RenderSink + ?Sized>(&mut self, event: &FeedEvent, sink: &mut S) -> bool {
        match event {
            FeedEvent::Data(record) => {
                self.apply(record, sink);
                true
            }
            FeedEvent::Closed => {
                self.disconnect(sink);
                false
            }
        }
    }

    fn series_update(&self, index: usize) -> SeriesUpdate {
        let entry = &self.metrics[index];
        SeriesUpdate {
            channel: self.channel.clone(),
            metric: entry.metric.name.clone(),
            points: entry.series.plot_points(),
            scale: entry.series.scale(),
            window_label: display::window_label_for(entry.series.span()),
            revision: self.revision,
        }
    }

    fn record_points(&self, _index: usize) {
        #[cfg(feature = "metrics")]
        {
            let entry = &self.metrics[_index];
            wxfeed_metrics::SERIES_POINTS
                .with_label_values(&[self.channel.as_str(), entry.metric.name.as_str()])
                .set(entry.series.len() as i64);
        }
    }
}

/// Panels plotting the same channel, driven by one live subscription.
pub struct PanelGroup {
    channel: Channel,
    panels: Vec<Panel>,
}

impl PanelGroup {
    /// Group panels by channel, keeping first-seen channel order and the
    /// panel order within each channel.
    pub fn by_channel(panels: Vec<Panel>) -> Vec<PanelGroup> {
        let mut groups: Vec<PanelGroup> = Vec::new();
        for panel in panels {
            match groups.iter_mut().find(|g| g.channel == panel.channel) {
                Some(group) => group.panels.push(panel),
                None => groups.push(PanelGroup {
                    channel: panel.channel.clone(),
                    panels: vec![panel],
                }),
            }
        }
        groups
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Seed every panel in the group. Returns the total samples seeded.
    pub async fn seed(&mut self, history: &HistoryClient) -> Result<usize> {
        let mut total = 0;
        for panel in &mut self.panels {
            total += panel.seed(history).await?;
        }
        Ok(total)
    }

    /// Fan every event of one feed out to all panels in the group.
    ///
    /// Returns the number of records received from the feed.
    pub async fn run<St, S>(&mut self, mut events: St, sink: &mut S) -> u64
    where
        St: Stream<Item = FeedEvent> + Unpin,
        S: RenderSink + ?Sized,
    {
        for panel in &self.panels {
            panel.publish(sink);
        }

        let mut received = 0;
        while let Some(event) = events.next().await {
            if matches!(event, FeedEvent::Data(_)) {
                received += 1;
            }
            for panel in &mut self.panels {
                panel.handle(&event, sink);
            }
        }

        debug!(
            channel = %self.channel,
            panels = self.panels.len(),
            records = received,
            "Panel group feed ended"
        );
        received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{CapacityPolicy, TimeOrigin};

    #[derive(Default)]
    struct Recorder {
        readings: Vec<ReadingUpdate>,
        series: Vec<SeriesUpdate>,
        disconnects: Vec<Vec<LabelUpdate>>,
    }

    impl RenderSink for Recorder {
        fn on_reading(&mut self, update: &ReadingUpdate) {
            self.readings.push(update.clone());
        }

        fn on_series(&mut self, update: &SeriesUpdate) {
            self.series.push(update.clone());
        }

        fn on_disconnected(&mut self, _channel: &Channel, placeholders: &[LabelUpdate]) {
            self.disconnects.push(placeholders.to_vec());
        }
    }

    #[test]
    fn test_labels_update_even_when_throttled() {
        let mut config = PanelConfig::environment(HistoryWindow::default());
        config.cadence_secs = Some(10.0);
        let mut panel = Panel::new(config).unwrap();
        let mut sink = Recorder::default();

        let record = |ts: f64| {
            Record::new(ts)
                .with_metric("temperature", 70.0)
                .with_metric("humidity", 40.0)
                .with_metric("pressure", 1013.2)
        };

        assert_eq!(panel.apply(&record(100.0), &mut sink), 3);
        assert_eq!(panel.apply(&record(105.0), &mut sink), 0);

        assert_eq!(sink.readings.len(), 2);
        assert_eq!(sink.readings[1].labels.len(), 3);
        assert_eq!(sink.series.len(), 3);
        assert_eq!(panel.revision(), 3);
    }

    #[test]
    fn test_missing_metric_is_ignored() {
        let mut panel = Panel::new(PanelConfig::environment(HistoryWindow::default())).unwrap();
        let mut sink = Recorder::default();

        let accepted = panel.apply(&Record::new(1.0).with_metric("pressure", 1000.0), &mut sink);
        assert_eq!(accepted, 1);
        assert_eq!(panel.series("temperature").unwrap().len(), 0);
        assert_eq!(sink.series[0].metric, "pressure");
        assert_eq!(sink.readings[0].labels[0].text, "1000");
    }

    #[test]
    fn test_disconnect_emits_placeholders() {
        let panel = Panel::new(PanelConfig::environment(HistoryWindow::default())).unwrap();
        let mut sink = Recorder::default();
        panel.disconnect(&mut sink);

        let texts: Vec<_> = sink.disconnects[0].iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["--.-°F", "--.-%", "----"]);
    }

    #[test]
    fn test_seed_with_unknown_metric() {
        let mut panel = Panel::new(PanelConfig::particulate()).unwrap();
        assert!(matches!(
            panel.seed_with("pressure", Vec::new()),
            Err(WxError::Config(_))
        ));
    }

    #[test]
    fn test_series_update_uses_relative_origin_and_scale() {
        let config = PanelConfig {
            channel: Channel::from("pm"),
            metrics: vec![MetricConfig::new("mc_2p5", "PM 2.5")],
            policy: CapacityPolicy::fixed_count(3),
            cadence_secs: None,
            origin: TimeOrigin::Relative,
            history: None,
        };
        let mut panel = Panel::new(config).unwrap();
        let mut sink = Recorder::default();

        panel.apply(&Record::new(500.0).with_metric("mc_2p5", 1.0), &mut sink);
        panel.apply(&Record::new(560.0).with_metric("mc_2p5", 150.0), &mut sink);

        let last = sink.series.last().unwrap();
        assert_eq!(last.points, vec![(0.0, 1.0), (60.0, 150.0)]);
        assert_eq!(last.scale, ScaleMode::Logarithmic);
        assert_eq!(last.window_label, "(the last 1 minute)");
        assert_eq!(last.revision, 2);
    }

    #[test]
    fn test_group_by_channel_keeps_order() {
        let pressure = PanelConfig {
            metrics: vec![MetricConfig::new("pressure", "Pressure")],
            ..PanelConfig::environment(HistoryWindow::default())
        };
        let panels = vec![
            Panel::new(pressure).unwrap(),
            Panel::new(PanelConfig::particulate()).unwrap(),
            Panel::new(PanelConfig::environment(HistoryWindow::default())).unwrap(),
        ];

        let groups = PanelGroup::by_channel(panels);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].channel().as_str(), "zero:sensor:BME280");
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0].panels()[0].metric_names().collect::<Vec<_>>(), vec!["pressure"]);
        assert_eq!(groups[1].channel().as_str(), "zed:sensor:SPS30");
        assert_eq!(groups[1].len(), 1);
    }

    #[test]
    fn test_particulate_plots_rounded_value() {
        let mut panel = Panel::new(PanelConfig::particulate()).unwrap();
        let mut sink = Recorder::default();

        panel.apply(&Record::new(10.0).with_metric("mc_2p5", 12.345), &mut sink);

        assert_eq!(sink.readings[0].labels[0].text, "12");
        assert_eq!(sink.series[0].points, vec![(0.0, 12.0)]);
    }
}
