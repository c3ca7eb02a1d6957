//! Backfill fetcher.
//!
//! Failure never reaches the caller: a transport error, a non-success status
//! or an unreadable body all degrade to an empty history, so the display
//! simply starts live-only.

use crate::api::ApiClient;
use crate::auth::CredentialProvider;
use crate::config::ClientConfig;
use std::sync::Arc;
use tracing::{debug, warn};
use wxfeed_types::{Channel, Result, Sample};

/// One bounded historical range query.
///
/// `back_minutes` and `cadence_secs` are sent as given; clamping them to the
/// ranges the server accepts is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub channel: Channel,
    pub metric: String,
    pub cadence_secs: u64,
    pub back_minutes: u64,
}

impl HistoryQuery {
    pub fn new(
        channel: impl Into<Channel>,
        metric: impl Into<String>,
        cadence_secs: u64,
        back_minutes: u64,
    ) -> Self {
        Self {
            channel: channel.into(),
            metric: metric.into(),
            cadence_secs,
            back_minutes,
        }
    }
}

#[derive(Clone)]
pub struct HistoryClient {
    api: ApiClient,
}

impl HistoryClient {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::from_api(ApiClient::new(config, credentials))
    }

    pub fn from_api(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch ascending history, or an empty vector if anything goes wrong.
    pub async fn fetch_history(&self, query: &HistoryQuery) -> Vec<Sample> {
        match self.try_fetch(query).await {
            Ok(samples) => {
                debug!(
                    channel = %query.channel,
                    metric = %query.metric,
                    count = samples.len(),
                    "Fetched history"
                );
                samples
            }
            Err(e) => {
                warn!(
                    channel = %query.channel,
                    metric = %query.metric,
                    back_minutes = query.back_minutes,
                    cadence_secs = query.cadence_secs,
                    error = %e,
                    "History fetch failed, continuing live-only"
                );

                #[cfg(feature = "metrics")]
                wxfeed_metrics::HISTORY_FETCH_FAILURES
                    .with_label_values(&[query.channel.as_str(), query.metric.as_str()])
                    .inc();

                Vec::new()
            }
        }
    }

    /// Same query, surfacing the failure instead of absorbing it.
    pub async fn try_fetch(&self, query: &HistoryQuery) -> Result<Vec<Sample>> {
        self.api
            .history(
                &query.channel,
                &query.metric,
                query.back_minutes,
                query.cadence_secs,
            )
            .await
    }
}
