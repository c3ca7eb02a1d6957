//! Sliding-window time series buffer.
//!
//! Points are kept in ascending timestamp order and evicted from the oldest
//! end. Two capacity policies exist:
//!
//! - `FixedCount`: keep the `count` newest points
//! - `TimeSpan`: keep points no older than `seconds × multiplier` relative to
//!   the newest point
//!
//! Live samples optionally pass a cadence gate first: a sample arriving less
//! than `cadence` seconds after the last accepted one is dropped. Backfill
//! seeding bypasses the gate.

use crate::error::{Result, WxError};
use crate::scale;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use wxfeed_types::{Sample, ScaleMode};

/// Bound enforced after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapacityPolicy {
    FixedCount { count: usize },
    TimeSpan { seconds: f64, multiplier: f64 },
}

impl CapacityPolicy {
    pub fn fixed_count(count: usize) -> Self {
        CapacityPolicy::FixedCount { count }
    }

    pub fn time_span(seconds: f64, multiplier: f64) -> Self {
        CapacityPolicy::TimeSpan {
            seconds,
            multiplier,
        }
    }

    /// Largest allowed `newest.ts - oldest.ts`, for time-span policies.
    pub fn max_age(&self) -> Option<f64> {
        match self {
            CapacityPolicy::FixedCount { .. } => None,
            CapacityPolicy::TimeSpan {
                seconds,
                multiplier,
            } => Some(seconds * multiplier),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            CapacityPolicy::FixedCount { count } if count == 0 => Err(WxError::InvalidPolicy(
                "fixed count must retain at least one point".to_string(),
            )),
            CapacityPolicy::TimeSpan {
                seconds,
                multiplier,
            } if !(seconds.is_finite() && seconds > 0.0 && multiplier.is_finite() && multiplier > 0.0) => {
                Err(WxError::InvalidPolicy(format!(
                    "time span needs positive finite seconds and multiplier, got {} x {}",
                    seconds, multiplier
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Which x coordinate a series plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeOrigin {
    /// x is the sample timestamp
    #[default]
    Absolute,
    /// x is seconds since the first sample the series ever saw
    Relative,
}

/// Outcome of a live append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    Accepted,
    /// Dropped by the cadence gate
    Throttled,
    /// Older than the newest point (or not a finite timestamp)
    Stale,
}

#[derive(Debug, Clone)]
pub struct Series {
    points: VecDeque<Sample>,
    policy: CapacityPolicy,
    cadence: Option<f64>,
    origin: TimeOrigin,
    last_accepted_ts: Option<f64>,
    first_seen_ts: Option<f64>,
}

impl Series {
    pub fn new(policy: CapacityPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            points: VecDeque::new(),
            policy,
            cadence: None,
            origin: TimeOrigin::Absolute,
            last_accepted_ts: None,
            first_seen_ts: None,
        })
    }

    /// Gate live samples to at most one per `seconds`. Non-positive disables.
    pub fn with_cadence(mut self, seconds: f64) -> Self {
        self.cadence = (seconds > 0.0).then_some(seconds);
        self
    }

    pub fn with_origin(mut self, origin: TimeOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn policy(&self) -> CapacityPolicy {
        self.policy
    }

    pub fn cadence(&self) -> Option<f64> {
        self.cadence
    }

    pub fn origin(&self) -> TimeOrigin {
        self.origin
    }

    pub fn last_accepted_ts(&self) -> Option<f64> {
        self.last_accepted_ts
    }

    pub fn first_seen_ts(&self) -> Option<f64> {
        self.first_seen_ts
    }

    /// Load backfill (ascending) without cadence gating.
    ///
    /// Only allowed before the series has seen any sample. Returns how many
    /// samples were taken; out-of-order samples are skipped.
    pub fn seed<I>(&mut self, samples: I) -> Result<usize>
    where
        I: IntoIterator<Item = Sample>,
    {
        if self.last_accepted_ts.is_some() {
            return Err(WxError::AlreadySeeded);
        }

        let mut seeded = 0;
        for sample in samples {
            if self.is_stale(sample.ts) {
                debug!(ts = sample.ts, "Skipping out-of-order backfill sample");
                continue;
            }
            self.push(sample);
            seeded += 1;
        }
        Ok(seeded)
    }

    /// Offer one live sample.
    pub fn append(&mut self, ts: f64, value: f64) -> Appended {
        if self.is_stale(ts) {
            return Appended::Stale;
        }

        if let (Some(cadence), Some(last)) = (self.cadence, self.last_accepted_ts) {
            if ts - last < cadence {
                return Appended::Throttled;
            }
        }

        self.push(Sample::new(ts, value));
        Appended::Accepted
    }

    fn is_stale(&self, ts: f64) -> bool {
        !ts.is_finite() || self.points.back().is_some_and(|newest| ts < newest.ts)
    }

    fn push(&mut self, sample: Sample) {
        if self.first_seen_ts.is_none() {
            self.first_seen_ts = Some(sample.ts);
        }

        match self.policy {
            CapacityPolicy::FixedCount { count } => {
                while self.points.len() >= count {
                    self.points.pop_front();
                }
                self.points.push_back(sample);
            }
            CapacityPolicy::TimeSpan {
                seconds,
                multiplier,
            } => {
                self.points.push_back(sample);
                let max_age = seconds * multiplier;
                let newest = sample.ts;
                while self
                    .points
                    .front()
                    .is_some_and(|oldest| newest - oldest.ts > max_age)
                {
                    self.points.pop_front();
                }
            }
        }

        self.last_accepted_ts = Some(match self.last_accepted_ts {
            Some(last) => last.max(sample.ts),
            None => sample.ts,
        });
    }

    pub fn points(&self) -> &VecDeque<Sample> {
        &self.points
    }

    pub fn to_vec(&self) -> Vec<Sample> {
        self.points.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.points.front()
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.points.back()
    }

    /// Seconds between oldest and newest point.
    pub fn span(&self) -> f64 {
        match (self.points.front(), self.points.back()) {
            (Some(oldest), Some(newest)) => newest.ts - oldest.ts,
            _ => 0.0,
        }
    }

    /// Plot coordinates, with the series' time origin applied to x.
    pub fn plot_points(&self) -> Vec<(f64, f64)> {
        let offset = match self.origin {
            TimeOrigin::Absolute => 0.0,
            TimeOrigin::Relative => self.first_seen_ts.unwrap_or(0.0),
        };
        self.points
            .iter()
            .map(|s| (s.ts - offset, s.value))
            .collect()
    }

    pub fn scale(&self) -> ScaleMode {
        scale::select_scale(self.points.iter())
    }
}
