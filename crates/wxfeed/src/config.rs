//! Panel and feed configuration.
//!
//! Everything here is plain data with defaults matching the public weather
//! page: an environment panel fed by the BME280 channel and a particulate
//! panel fed by the SPS30 channel.

use crate::display;
use crate::error::{Result, WxError};
use crate::series::{CapacityPolicy, TimeOrigin};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use wxfeed_client::{BackoffConfig, ClientConfig, Endpoints, HistoryQuery};
use wxfeed_types::Channel;

pub const ENVIRONMENT_CHANNEL: &str = "zero:sensor:BME280";
pub const PARTICULATE_CHANNEL: &str = "zed:sensor:SPS30";

/// Points kept by the particulate panel.
pub const PARTICULATE_WINDOW: usize = 150;

/// How much history a panel asks for, and how finely.
///
/// Values are clamped to what the history endpoint accepts:
/// `back_minutes` in `1..=2160`, `cadence_secs` in `10..=back_minutes * 30`
/// and `multiplier` in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryWindow {
    pub back_minutes: u64,
    pub cadence_secs: u64,
    /// How many `back_minutes` worth of points the live buffer retains
    pub multiplier: u64,
}

impl HistoryWindow {
    pub const MAX_BACK_MINUTES: u64 = 2160;
    pub const MIN_CADENCE_SECS: u64 = 10;
    pub const MAX_MULTIPLIER: u64 = 5;

    pub const DEFAULT_CADENCE_SECS: u64 = 600;
    pub const DEFAULT_MULTIPLIER: u64 = 2;

    /// Build a window from optional overrides, clamping each given value.
    ///
    /// The default cadence is used as-is when no cadence is given.
    pub fn clamped(
        back_minutes: Option<u64>,
        cadence_secs: Option<u64>,
        multiplier: Option<u64>,
    ) -> Self {
        let back_minutes = back_minutes
            .map(|b| b.clamp(1, Self::MAX_BACK_MINUTES))
            .unwrap_or(Self::MAX_BACK_MINUTES);
        let cadence_secs = cadence_secs
            .map(|c| c.min(back_minutes * 30).max(Self::MIN_CADENCE_SECS))
            .unwrap_or(Self::DEFAULT_CADENCE_SECS);
        let multiplier = multiplier
            .map(|m| m.clamp(1, Self::MAX_MULTIPLIER))
            .unwrap_or(Self::DEFAULT_MULTIPLIER);

        Self {
            back_minutes,
            cadence_secs,
            multiplier,
        }
    }

    /// Re-apply the clamps, e.g. after deserializing user input.
    pub fn normalized(self) -> Self {
        Self::clamped(
            Some(self.back_minutes),
            Some(self.cadence_secs),
            Some(self.multiplier),
        )
    }

    pub fn span_seconds(&self) -> f64 {
        (self.back_minutes * 60) as f64
    }

    pub fn capacity_policy(&self) -> CapacityPolicy {
        CapacityPolicy::time_span(self.span_seconds(), self.multiplier as f64)
    }

    pub fn query(&self, channel: &Channel, metric: &str) -> HistoryQuery {
        HistoryQuery::new(
            channel.clone(),
            metric,
            self.cadence_secs,
            self.back_minutes,
        )
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::clamped(None, None, None)
    }
}

/// One metric carried by a panel's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Key inside the record's value map
    pub name: String,
    pub label: String,
    /// Suffix appended to the formatted value
    #[serde(default)]
    pub unit: String,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default = "default_precision")]
    pub precision: u32,
    /// Shown while the channel is disconnected
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Plot the rounded value shown in the label instead of the raw reading
    #[serde(default)]
    pub plot_rounded: bool,
}

fn default_factor() -> f64 {
    10.0
}

fn default_precision() -> u32 {
    3
}

fn default_placeholder() -> String {
    display::MISSING_VALUE.to_string()
}

impl MetricConfig {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            unit: String::new(),
            factor: default_factor(),
            precision: default_precision(),
            placeholder: default_placeholder(),
            plot_rounded: false,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_rounding(mut self, factor: f64, precision: u32) -> Self {
        self.factor = factor;
        self.precision = precision;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_plot_rounded(mut self) -> Self {
        self.plot_rounded = true;
        self
    }

    /// Value offered to the metric's buffer for a live reading.
    pub fn plot_value(&self, value: f64) -> f64 {
        if !self.plot_rounded {
            return value;
        }
        display::round_value(value, self.factor, self.precision).unwrap_or(value)
    }

    /// Label text for a live value, unit included.
    pub fn format(&self, value: f64) -> String {
        format!(
            "{}{}",
            display::display_value(value, self.factor, self.precision),
            self.unit
        )
    }
}

/// One channel and the metrics plotted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub channel: Channel,
    pub metrics: Vec<MetricConfig>,
    pub policy: CapacityPolicy,
    /// Minimum seconds between accepted live samples
    #[serde(default)]
    pub cadence_secs: Option<f64>,
    #[serde(default)]
    pub origin: TimeOrigin,
    /// Backfill to seed the buffers with, if any
    #[serde(default)]
    pub history: Option<HistoryWindow>,
}

impl PanelConfig {
    /// BME280 temperature, humidity and pressure over a history window.
    pub fn environment(window: HistoryWindow) -> Self {
        Self {
            channel: Channel::from(ENVIRONMENT_CHANNEL),
            metrics: vec![
                MetricConfig::new("temperature", "Outdoor Temperature")
                    .with_unit("°F")
                    .with_placeholder("--.-°F"),
                MetricConfig::new("humidity", "Relative Humidity")
                    .with_unit("%")
                    .with_placeholder("--.-%"),
                MetricConfig::new("pressure", "Barometric Pressure")
                    .with_rounding(10.0, 5)
                    .with_placeholder("----"),
            ],
            policy: window.capacity_policy(),
            cadence_secs: Some(window.cadence_secs as f64),
            origin: TimeOrigin::Absolute,
            history: Some(window),
        }
    }

    /// SPS30 PM2.5 over the last 150 readings, plotted relative to first sight.
    pub fn particulate() -> Self {
        Self {
            channel: Channel::from(PARTICULATE_CHANNEL),
            metrics: vec![MetricConfig::new("mc_2p5", "PM 2.5")
                .with_rounding(100.0, 3)
                .with_plot_rounded()],
            policy: CapacityPolicy::fixed_count(PARTICULATE_WINDOW),
            cadence_secs: None,
            origin: TimeOrigin::Relative,
            history: None,
        }
    }

    pub fn metric(&self, name: &str) -> Option<&MetricConfig> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channel.as_str().is_empty() {
            return Err(WxError::Config("panel channel is empty".to_string()));
        }
        if self.metrics.is_empty() {
            return Err(WxError::Config(format!(
                "panel {} has no metrics",
                self.channel
            )));
        }

        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if !seen.insert(metric.name.as_str()) {
                return Err(WxError::Config(format!(
                    "panel {} lists metric {} twice",
                    self.channel, metric.name
                )));
            }
        }

        if let Some(cadence) = self.cadence_secs {
            if !cadence.is_finite() || cadence < 0.0 {
                return Err(WxError::Config(format!(
                    "panel {} has invalid cadence {}",
                    self.channel, cadence
                )));
            }
        }

        self.policy.validate()
    }
}

/// Top-level settings: where the upstream lives and which panels to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Page host the endpoints are derived from
    pub host: String,
    /// Extra host names (or `.suffix` entries) served on the local port
    pub local_hosts: Vec<String>,
    pub http_base: Option<String>,
    pub ws_base: Option<String>,
    pub request_timeout_secs: u64,
    /// Upper bound on the reconnect delay; `None` keeps growing forever
    pub max_backoff_ms: Option<u64>,
    pub panels: Vec<PanelConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            local_hosts: Vec::new(),
            http_base: None,
            ws_base: None,
            request_timeout_secs: 10,
            max_backoff_ms: Some(30_000),
            panels: Self::default_panels(HistoryWindow::default(), true),
        }
    }
}

impl FeedConfig {
    /// The environment panel, plus the particulate panel when asked for.
    pub fn default_panels(window: HistoryWindow, particulate: bool) -> Vec<PanelConfig> {
        let mut panels = vec![PanelConfig::environment(window)];
        if particulate {
            panels.push(PanelConfig::particulate());
        }
        panels
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut config: FeedConfig = serde_json::from_str(json)
            .map_err(|e| WxError::Config(format!("Failed to parse config: {}", e)))?;

        for panel in &mut config.panels {
            panel.history = panel.history.map(HistoryWindow::normalized);
            panel.validate()?;
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            WxError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            panels = config.panels.len(),
            "Loaded feed config"
        );
        Ok(config)
    }

    pub fn endpoints(&self) -> Endpoints {
        let derived = Endpoints::for_host_with(&self.host, &self.local_hosts);
        Endpoints::new(
            self.http_base.clone().unwrap_or(derived.http_base),
            self.ws_base.clone().unwrap_or(derived.ws_base),
        )
    }

    pub fn client_config(&self) -> ClientConfig {
        let backoff = BackoffConfig::default()
            .with_max_delay(self.max_backoff_ms.map(Duration::from_millis));
        ClientConfig::new(self.endpoints())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs.max(1)))
            .with_backoff(backoff)
    }
}
