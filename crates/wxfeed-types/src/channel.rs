//! Channel and ticket identifiers.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Name of a live feed, e.g. `zero:sensor:BME280`.
///
/// One channel may carry several metrics inside a single record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub String);

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Channel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Single-use token minted by the control endpoint.
///
/// Authorizes exactly one stream connection, so it is consumed when the
/// stream URL is built and cannot be cloned.
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket(String);

impl Ticket {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Consume the ticket, yielding the raw query string it stands for.
    pub fn into_query(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
