//! Subscription events and axis scale decisions.

use crate::sample::Record;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Events yielded by a live subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A decoded record from the stream
    Data(Record),
    /// The stream closed; a reconnect is scheduled
    Closed,
}

/// Axis scale chosen for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    #[default]
    Linear,
    Logarithmic,
}

impl Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleMode::Linear => write!(f, "linear"),
            ScaleMode::Logarithmic => write!(f, "log"),
        }
    }
}
