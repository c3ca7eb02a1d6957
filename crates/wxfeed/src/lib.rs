//! # wxfeed
//!
//! Bounded, display-ready time-series windows for a live sensor feed.
//!
//! A [`Panel`] owns one channel and a buffer per metric. It is seeded from a
//! historical backfill, then updated from the channel's live subscription:
//! every record refreshes the panel's labels, and each metric value goes
//! through its buffer's cadence gate and eviction policy before the axis
//! scale is recomputed and the renderer is notified.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wxfeed::{HistoryWindow, Panel, PanelConfig};
//!
//! let mut panel = Panel::new(PanelConfig::environment(HistoryWindow::default()))?;
//! panel.seed(&history).await?;
//! let subscription = registry.subscribe(panel.channel().clone());
//! panel.run(subscription, &mut renderer).await;
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod panel;
pub mod scale;
pub mod series;

pub use config::{FeedConfig, HistoryWindow, MetricConfig, PanelConfig};
pub use error::{Result, WxError};
pub use panel::{LabelUpdate, Panel, PanelGroup, ReadingUpdate, RenderSink, SeriesUpdate};
pub use scale::select_scale;
pub use series::{Appended, CapacityPolicy, Series, TimeOrigin};

pub use wxfeed_types::{Channel, FeedEvent, Record, Sample, ScaleMode};
