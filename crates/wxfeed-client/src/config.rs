//! Client configuration and endpoint resolution.

use crate::backoff::BackoffConfig;
use std::time::Duration;
use wxfeed_types::{Channel, Ticket};

/// Port the API listens on when the page is served from a local host.
pub const LOCAL_API_PORT: u16 = 56545;

/// Base URLs for the HTTP and websocket sides of the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// e.g. `https://api.example.org`
    pub http_base: String,
    /// e.g. `wss://api.example.org`
    pub ws_base: String,
}

impl Endpoints {
    pub fn new(http_base: impl Into<String>, ws_base: impl Into<String>) -> Self {
        Self {
            http_base: http_base.into().trim_end_matches('/').to_string(),
            ws_base: ws_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolve endpoints the way the dashboard page does from its own host.
    pub fn for_host(host: &str) -> Self {
        Self::for_host_with(host, &[])
    }

    /// Like [`Endpoints::for_host`], treating `extra_local` names (exact, or
    /// suffixes when they start with `.`) as local.
    pub fn for_host_with(host: &str, extra_local: &[String]) -> Self {
        let hostname = strip_port(host);
        if is_local_host(hostname, extra_local) {
            Self::new(
                format!("http://{}:{}", hostname, LOCAL_API_PORT),
                format!("ws://{}:{}", hostname, LOCAL_API_PORT),
            )
        } else {
            Self::new(format!("https://api.{}", host), format!("wss://api.{}", host))
        }
    }

    /// Backfill query for one metric of a channel.
    pub fn history_url(
        &self,
        channel: &Channel,
        metric: &str,
        back_minutes: u64,
        cadence_secs: u64,
    ) -> String {
        format!(
            "{}/list/{}:{}:.list?back={}&cad={}",
            self.http_base, channel, metric, back_minutes, cadence_secs
        )
    }

    pub fn ticket_url(&self, channel: &Channel) -> String {
        format!("{}/sub/{}", self.http_base, channel)
    }

    /// Stream URL; consumes the single-use ticket.
    pub fn stream_url(&self, ticket: Ticket) -> String {
        format!("{}/ws/sub?{}", self.ws_base, ticket.into_query())
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::for_host("localhost")
    }
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Whether `hostname` should talk to the API directly on [`LOCAL_API_PORT`].
pub fn is_local_host(hostname: &str, extra_local: &[String]) -> bool {
    if hostname == "localhost"
        || hostname.starts_with("127.")
        || hostname.starts_with("192.168.")
        || hostname.starts_with("10.0.")
    {
        return true;
    }

    extra_local.iter().any(|name| {
        if name.starts_with('.') {
            hostname.ends_with(name.as_str())
        } else {
            hostname == name
        }
    })
}

/// Configuration shared by the history client and the subscriber.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    /// Timeout applied to ticket and history requests
    pub request_timeout: Duration,
    /// Reconnect backoff for live subscriptions
    pub backoff: BackoffConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            request_timeout: Duration::from_secs(10),
            backoff: BackoffConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            ..Default::default()
        }
    }

    pub fn for_host(host: &str) -> Self {
        Self::new(Endpoints::for_host(host))
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_hosts_use_direct_port() {
        for host in ["localhost", "192.168.1.20", "10.0.0.7", "127.0.0.1:8080"] {
            let endpoints = Endpoints::for_host(host);
            assert!(
                endpoints.http_base.starts_with("http://") && endpoints.http_base.ends_with(":56545"),
                "{} -> {:?}",
                host,
                endpoints
            );
            assert!(endpoints.ws_base.starts_with("ws://"));
        }
        assert_eq!(
            Endpoints::for_host("127.0.0.1:8080").http_base,
            "http://127.0.0.1:56545"
        );
    }

    #[test]
    fn test_remote_host_uses_api_subdomain() {
        let endpoints = Endpoints::for_host("weather.example.org");
        assert_eq!(endpoints.http_base, "https://api.weather.example.org");
        assert_eq!(endpoints.ws_base, "wss://api.weather.example.org");
    }

    #[test]
    fn test_extra_local_names_and_suffixes() {
        let extra = vec!["basement-pi".to_string(), ".home.lan".to_string()];
        assert!(is_local_host("basement-pi", &extra));
        assert!(is_local_host("kitchen.home.lan", &extra));
        assert!(!is_local_host("home.lan.example.com", &extra));
        assert_eq!(
            Endpoints::for_host_with("kitchen.home.lan", &extra).ws_base,
            "ws://kitchen.home.lan:56545"
        );
    }

    #[test]
    fn test_request_urls() {
        let endpoints = Endpoints::new("http://127.0.0.1:9000/", "ws://127.0.0.1:9000");
        let channel = Channel::from("zero:sensor:BME280");

        assert_eq!(
            endpoints.history_url(&channel, "pressure", 2160, 600),
            "http://127.0.0.1:9000/list/zero:sensor:BME280:pressure:.list?back=2160&cad=600"
        );
        assert_eq!(
            endpoints.ticket_url(&channel),
            "http://127.0.0.1:9000/sub/zero:sensor:BME280"
        );
        assert_eq!(
            endpoints.stream_url(Ticket::new("t=abc")),
            "ws://127.0.0.1:9000/ws/sub?t=abc"
        );
    }
}
