//! Wire codec for stream frames and history responses.
//!
//! Stream frames are double-encoded: the websocket payload is a JSON string
//! literal whose contents are the JSON record. Both layers are decoded
//! explicitly so the quirk stays visible and wire-compatible.

use wxfeed_types::{FeedError, Record, Result, Sample};

/// Decode one stream frame into a [`Record`].
pub fn decode_frame(payload: &str) -> Result<Record> {
    let inner: String = serde_json::from_str(payload)
        .map_err(|e| FeedError::DecodeFault(format!("frame outer layer: {}", e)))?;

    serde_json::from_str(&inner)
        .map_err(|e| FeedError::DecodeFault(format!("frame inner layer: {}", e)))
}

/// Encode a record the way the upstream transport frames it.
pub fn encode_frame(record: &Record) -> Result<String> {
    let inner = serde_json::to_string(record)?;
    Ok(serde_json::to_string(&inner)?)
}

/// Decode a history response (newest first) into ascending samples.
pub fn decode_history(body: &[u8]) -> Result<Vec<Sample>> {
    let mut samples: Vec<Sample> = serde_json::from_slice(body)
        .map_err(|e| FeedError::DecodeFault(format!("history body: {}", e)))?;
    samples.reverse();
    Ok(samples)
}
