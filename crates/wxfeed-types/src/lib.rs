//! # wxfeed-types
//!
//! Core domain types shared across the wxfeed crates.
//!
//! This crate provides:
//! - Channel and ticket identifiers
//! - Samples and live records
//! - The subscription event type
//! - The feed error taxonomy
//!
//! ## Design Philosophy
//!
//! This crate intentionally has minimal dependencies so that both the network
//! client and the windowing core can share it without pulling in a runtime.

pub mod channel;
pub mod error;
pub mod event;
pub mod sample;

// Re-exports for convenience
pub use channel::{Channel, Ticket};
pub use error::{FeedError, Result};
pub use event::{FeedEvent, ScaleMode};
pub use sample::{Record, Sample};
