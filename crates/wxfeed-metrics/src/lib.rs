//! wxfeed Metrics - Prometheus metrics export and HTTP server
//!
//! Counters for the live subscription (frames, decode faults, closures,
//! reconnects), backfill failures and per-series window state.

pub mod exporter;
pub mod server;

pub use exporter::*;
pub use server::MetricsServer;
