//! Samples and live records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single `(timestamp, value)` observation.
///
/// Timestamps are seconds since the epoch. On the wire a sample is a
/// two-element array `[ts, value]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Sample {
    pub ts: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(ts: f64, value: f64) -> Self {
        Self { ts, value }
    }
}

impl From<(f64, f64)> for Sample {
    fn from((ts, value): (f64, f64)) -> Self {
        Self { ts, value }
    }
}

impl From<Sample> for (f64, f64) {
    fn from(sample: Sample) -> Self {
        (sample.ts, sample.value)
    }
}

/// One inbound live message: a timestamp plus one value per metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub ts: f64,
    pub value: BTreeMap<String, f64>,
}

impl Record {
    pub fn new(ts: f64) -> Self {
        Self {
            ts,
            value: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.value.insert(metric.into(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.value.get(name).copied()
    }

    /// The record's reading for `name` as a standalone sample.
    pub fn sample(&self, name: &str) -> Option<Sample> {
        self.metric(name).map(|value| Sample::new(self.ts, value))
    }

    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.value.keys().map(String::as_str)
    }
}
