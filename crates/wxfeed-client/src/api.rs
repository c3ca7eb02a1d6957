//! Authorized HTTP calls against the feed API.

use crate::auth::CredentialProvider;
use crate::codec;
use crate::config::{ClientConfig, Endpoints};
use reqwest::header::AUTHORIZATION;
use std::sync::Arc;
use tracing::{debug, warn};
use wxfeed_types::{Channel, FeedError, Result, Sample, Ticket};

/// Shared HTTP client, endpoints and credentials.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: Arc<Endpoints>,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Build a client honoring the configured request timeout.
    pub fn try_new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FeedError::InvalidConfig(format!("building HTTP client: {}", e)))?;

        Ok(Self::with_http_client(http, config.endpoints.clone(), credentials))
    }

    /// Like [`ApiClient::try_new`], falling back to a default HTTP client
    /// without the request timeout if the configured one cannot be built.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        match Self::try_new(config, credentials.clone()) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Falling back to default HTTP client, request timeout disabled");
                Self::with_http_client(reqwest::Client::new(), config.endpoints.clone(), credentials)
            }
        }
    }

    pub fn with_http_client(
        http: reqwest::Client,
        endpoints: Endpoints,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            http,
            endpoints: Arc::new(endpoints),
            credentials,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn authorized_get(&self, url: &str) -> Result<reqwest::Response> {
        let mut req = self.http.get(url);
        if let Some(auth) = self.credentials.authorization() {
            req = req.header(AUTHORIZATION, auth);
        }

        let response = req
            .send()
            .await
            .map_err(|e| FeedError::TransportFailure(format!("GET {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(FeedError::UpstreamRejection {
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }

    /// Mint a single-use stream ticket for `channel`.
    pub async fn request_ticket(&self, channel: &Channel) -> Result<Ticket> {
        let url = self.endpoints.ticket_url(channel);
        debug!(channel = %channel, "Requesting stream ticket");

        let body = self
            .authorized_get(&url)
            .await?
            .text()
            .await
            .map_err(|e| FeedError::TransportFailure(format!("reading ticket: {}", e)))?;

        Ok(Ticket::new(body.trim()))
    }

    /// Raw backfill query. Samples come back in ascending time order.
    pub async fn history(
        &self,
        channel: &Channel,
        metric: &str,
        back_minutes: u64,
        cadence_secs: u64,
    ) -> Result<Vec<Sample>> {
        let url = self
            .endpoints
            .history_url(channel, metric, back_minutes, cadence_secs);
        debug!(url = %url, "Fetching history");

        let body = self
            .authorized_get(&url)
            .await?
            .bytes()
            .await
            .map_err(|e| FeedError::TransportFailure(format!("reading history: {}", e)))?;

        codec::decode_history(&body)
    }
}
