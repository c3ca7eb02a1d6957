use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

/// Failures on the feed's network boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The request could not be sent or the stream could not open
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Upstream rejected request with status {status}")]
    UpstreamRejection { status: u16 },

    #[error("Stream closed: {0}")]
    StreamClosed(String),

    /// A frame or response body could not be decoded
    #[error("Decode fault: {0}")]
    DecodeFault(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::DecodeFault(e.to_string())
    }
}
