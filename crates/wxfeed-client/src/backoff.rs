//! Reconnect backoff.
//!
//! The delay before the next attempt is `unit × growth(attempts)`, after which
//! `attempts` is incremented. With the default quadratic growth and a 1 ms unit
//! the delays run 0, 1, 4, 9, 16 ... ms. Only a successful stream open resets
//! the counter, so closures of a flapping stream keep compounding the delay.

use std::time::Duration;

/// Growth function applied to the attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffGrowth {
    /// `attempts²`
    #[default]
    Quadratic,
    /// `2^attempts`
    Exponential,
    /// Always one unit
    Constant,
}

impl BackoffGrowth {
    pub fn factor(&self, attempts: u32) -> u64 {
        let n = u64::from(attempts);
        match self {
            BackoffGrowth::Quadratic => n.saturating_mul(n),
            BackoffGrowth::Exponential => 2u64.saturating_pow(attempts),
            BackoffGrowth::Constant => 1,
        }
    }
}

/// Tunables for reconnect backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffConfig {
    pub growth: BackoffGrowth,
    /// Duration of one growth step
    pub unit: Duration,
    /// Upper bound on any single delay (`None` = unbounded)
    pub max_delay: Option<Duration>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            growth: BackoffGrowth::Quadratic,
            unit: Duration::from_millis(1),
            max_delay: Some(Duration::from_secs(30)),
        }
    }
}

impl BackoffConfig {
    /// Quadratic millisecond backoff with no ceiling.
    pub fn uncapped() -> Self {
        Self {
            max_delay: None,
            ..Default::default()
        }
    }

    pub fn with_growth(mut self, growth: BackoffGrowth) -> Self {
        self.growth = growth;
        self
    }

    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Option<Duration>) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay to wait when `attempts` failures have been counted so far.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let nanos = self
            .unit
            .as_nanos()
            .saturating_mul(u128::from(self.growth.factor(attempts)));
        let delay = Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX));

        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

/// Attempt counter for one subscription.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay the next failure would produce, without counting it.
    pub fn peek_delay(&self) -> Duration {
        self.config.delay_for(self.attempts)
    }

    /// Record a failure and return how long to wait before retrying.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.config.delay_for(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    /// Called once a stream has opened successfully.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
