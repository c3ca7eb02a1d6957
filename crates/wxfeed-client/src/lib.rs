//! # wxfeed-client
//!
//! Network side of the sensor feed.
//!
//! This crate provides:
//! - **Backfill**: one bounded historical range query per metric, returned in
//!   ascending time order, degrading to an empty history on any failure
//! - **Live subscription**: a ticket + websocket state machine that reconnects
//!   forever with configurable (quadratic by default) backoff
//! - **Registry**: at most one live subscription per channel
//!
//! ## Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use wxfeed_client::{BasicCredentials, ClientConfig, Subscriber};
//! use wxfeed_types::FeedEvent;
//!
//! let config = ClientConfig::for_host("weather.example.org");
//! let credentials = Arc::new(BasicCredentials::from_user_password("me", "secret"));
//! let subscriber = Subscriber::new(&config, credentials);
//!
//! let mut feed = subscriber.subscribe("zero:sensor:BME280".into(), CancellationToken::new());
//! while let Some(event) = feed.next().await {
//!     match event {
//!         FeedEvent::Data(record) => println!("{:?}", record),
//!         FeedEvent::Closed => println!("disconnected"),
//!     }
//! }
//! ```

pub mod api;
pub mod auth;
pub mod backoff;
pub mod codec;
pub mod config;
pub mod history;
pub mod registry;
pub mod ws;

pub use api::ApiClient;
pub use auth::{BasicCredentials, CredentialProvider, NoCredentials};
pub use backoff::{Backoff, BackoffConfig, BackoffGrowth};
pub use config::{ClientConfig, Endpoints, LOCAL_API_PORT};
pub use history::{HistoryClient, HistoryQuery};
pub use registry::SubscriptionRegistry;
pub use ws::{Subscriber, Subscription, SubscriptionState};

// Re-export the shared types for convenience
pub use wxfeed_types::{Channel, FeedError, FeedEvent, Record, Sample, Ticket};
