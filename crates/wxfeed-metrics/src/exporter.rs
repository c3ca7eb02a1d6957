//! Prometheus metrics exporter

use prometheus::{
    register_gauge_vec, register_int_counter_vec, register_int_gauge_vec, Encoder, GaugeVec,
    IntCounterVec, IntGaugeVec, TextEncoder,
};

lazy_static::lazy_static! {
    /// Frames decoded into records, by channel
    pub static ref FRAMES_RECEIVED: IntCounterVec = register_int_counter_vec!(
        "wxfeed_frames_received_total",
        "Total number of stream frames decoded into records",
        &["channel"]
    ).unwrap();

    /// Frames skipped because they could not be decoded
    pub static ref DECODE_FAULTS: IntCounterVec = register_int_counter_vec!(
        "wxfeed_decode_faults_total",
        "Total number of malformed frames skipped",
        &["channel"]
    ).unwrap();

    /// Closures of streams that had opened
    pub static ref STREAM_CLOSURES: IntCounterVec = register_int_counter_vec!(
        "wxfeed_stream_closures_total",
        "Total number of open streams that closed",
        &["channel"]
    ).unwrap();

    /// Reconnect cycles scheduled (ticket failure, open failure or closure)
    pub static ref RECONNECT_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "wxfeed_reconnect_attempts_total",
        "Total number of reconnects scheduled",
        &["channel"]
    ).unwrap();

    /// Most recent backoff delay
    pub static ref BACKOFF_DELAY_SECONDS: GaugeVec = register_gauge_vec!(
        "wxfeed_backoff_delay_seconds",
        "Delay before the most recently scheduled reconnect",
        &["channel"]
    ).unwrap();

    /// History queries that degraded to an empty backfill
    pub static ref HISTORY_FETCH_FAILURES: IntCounterVec = register_int_counter_vec!(
        "wxfeed_history_fetch_failures_total",
        "Total number of history queries that failed",
        &["channel", "metric"]
    ).unwrap();

    /// Live samples dropped by the cadence gate
    pub static ref SAMPLES_THROTTLED: IntCounterVec = register_int_counter_vec!(
        "wxfeed_samples_throttled_total",
        "Total number of live samples dropped by the cadence gate",
        &["channel", "metric"]
    ).unwrap();

    /// Points currently held by a series window
    pub static ref SERIES_POINTS: IntGaugeVec = register_int_gauge_vec!(
        "wxfeed_series_points",
        "Number of points currently in a series window",
        &["channel", "metric"]
    ).unwrap();
}

/// Export metrics in Prometheus text format
pub fn export_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
