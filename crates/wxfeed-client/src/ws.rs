//! Self-healing live subscription.
//!
//! Each subscription runs the cycle
//! `RequestingTicket -> Connecting -> Streaming -> Closed -> RequestingTicket`
//! until its cancellation token fires. Ticket and connect failures, as well as
//! any closure of an open stream, are retried after a backoff delay. Only a
//! successful stream open resets the backoff.
//!
//! # Example
//! ```rust,ignore
//! use wxfeed_client::ws::Subscriber;
//!
//! let mut feed = subscriber.subscribe("zero:sensor:BME280".into(), CancellationToken::new());
//! while let Some(event) = feed.next().await {
//!     match event {
//!         FeedEvent::Data(record) => println!("Got: {:?}", record),
//!         FeedEvent::Closed => println!("Disconnected"),
//!     }
//! }
//! ```

use crate::api::ApiClient;
use crate::auth::CredentialProvider;
use crate::backoff::{Backoff, BackoffConfig};
use crate::codec;
use crate::config::ClientConfig;
use futures::{Stream, StreamExt};
use std::fmt::{self, Display};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wxfeed_types::{Channel, FeedError, FeedEvent, Record};

/// Where a subscription currently is in its connect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Created but not yet polled
    Idle,
    RequestingTicket,
    Connecting,
    Streaming,
    /// Disconnected, waiting out the backoff delay
    Closed,
}

impl Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubscriptionState::Idle => "idle",
            SubscriptionState::RequestingTicket => "requesting_ticket",
            SubscriptionState::Connecting => "connecting",
            SubscriptionState::Streaming => "streaming",
            SubscriptionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Opens live subscriptions.
#[derive(Clone)]
pub struct Subscriber {
    api: ApiClient,
    backoff: BackoffConfig,
}

impl Subscriber {
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::from_api(ApiClient::new(config, credentials), config.backoff.clone())
    }

    pub fn from_api(api: ApiClient, backoff: BackoffConfig) -> Self {
        Self { api, backoff }
    }

    /// Start a subscription to `channel`.
    ///
    /// The returned stream is lazy: nothing happens until it is polled. It
    /// never ends on its own; cancelling `cancel` ends it.
    pub fn subscribe(&self, channel: Channel, cancel: CancellationToken) -> Subscription {
        let (state_tx, state_rx) = watch::channel(SubscriptionState::Idle);
        let events = feed_stream(
            self.api.clone(),
            self.backoff.clone(),
            channel.clone(),
            cancel.clone(),
            state_tx,
        );

        Subscription {
            channel,
            events: Box::pin(events),
            state: state_rx,
            cancel,
        }
    }
}

/// A live, self-healing event stream for one channel.
pub struct Subscription {
    channel: Channel,
    events: Pin<Box<dyn Stream<Item = FeedEvent> + Send>>,
    state: watch::Receiver<SubscriptionState>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn state(&self) -> SubscriptionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn state_watcher(&self) -> watch::Receiver<SubscriptionState> {
        self.state.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// End the subscription; the stream yields `None` on its next poll.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for Subscription {
    type Item = FeedEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.as_mut().poll_next(cx)
    }
}

fn feed_stream(
    api: ApiClient,
    backoff_config: BackoffConfig,
    channel: Channel,
    cancel: CancellationToken,
    state: watch::Sender<SubscriptionState>,
) -> impl Stream<Item = FeedEvent> + Send + 'static {
    async_stream::stream! {
        let mut backoff = Backoff::new(backoff_config);

        loop {
            if cancel.is_cancelled() {
                break;
            }

            state.send_replace(SubscriptionState::RequestingTicket);
            let ticket = tokio::select! {
                _ = cancel.cancelled() => break,
                result = api.request_ticket(&channel) => result,
            };

            match ticket {
                Ok(ticket) => {
                    state.send_replace(SubscriptionState::Connecting);
                    let url = api.endpoints().stream_url(ticket);

                    let connected = tokio::select! {
                        _ = cancel.cancelled() => break,
                        result = connect_async(url.as_str()) => result,
                    };

                    match connected {
                        Ok((ws_stream, _)) => {
                            backoff.reset();
                            state.send_replace(SubscriptionState::Streaming);
                            info!(channel = %channel, "Stream open");

                            let (_write, mut read) = ws_stream.split();

                            let closed = loop {
                                let msg = tokio::select! {
                                    _ = cancel.cancelled() => break None,
                                    msg = read.next() => msg,
                                };

                                match msg {
                                    Some(Ok(Message::Text(text))) => {
                                        if let Some(record) = decode_or_skip(&channel, &text) {
                                            yield FeedEvent::Data(record);
                                        }
                                    }
                                    Some(Ok(Message::Binary(bytes))) => {
                                        match std::str::from_utf8(&bytes) {
                                            Ok(text) => {
                                                if let Some(record) = decode_or_skip(&channel, text) {
                                                    yield FeedEvent::Data(record);
                                                }
                                            }
                                            Err(e) => {
                                                warn!(channel = %channel, error = %e, "Skipping non-UTF-8 frame");
                                                count_decode_fault(&channel);
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Close(frame))) => break Some(close_cause(frame)),
                                    Some(Ok(_)) => {
                                        debug!(channel = %channel, "Ignoring control frame");
                                    }
                                    Some(Err(e)) => {
                                        let cause = FeedError::StreamClosed(e.to_string());
                                        warn!(channel = %channel, error = %cause, "Stream error");
                                        break Some(cause);
                                    }
                                    None => break Some(FeedError::StreamClosed("end of stream".to_string())),
                                }
                            };

                            let Some(cause) = closed else {
                                break;
                            };
                            info!(channel = %channel, cause = %cause, "Stream closed");

                            state.send_replace(SubscriptionState::Closed);
                            #[cfg(feature = "metrics")]
                            wxfeed_metrics::STREAM_CLOSURES
                                .with_label_values(&[channel.as_str()])
                                .inc();
                            yield FeedEvent::Closed;
                        }
                        Err(e) => {
                            warn!(channel = %channel, error = %e, "Stream open failed");
                        }
                    }
                }
                Err(e) => {
                    warn!(channel = %channel, error = %e, "Ticket request failed");
                }
            }

            state.send_replace(SubscriptionState::Closed);
            let delay = backoff.next_delay();
            info!(
                channel = %channel,
                attempt = backoff.attempts(),
                delay = ?delay,
                "Reconnecting..."
            );

            #[cfg(feature = "metrics")]
            {
                wxfeed_metrics::RECONNECT_ATTEMPTS
                    .with_label_values(&[channel.as_str()])
                    .inc();
                wxfeed_metrics::BACKOFF_DELAY_SECONDS
                    .with_label_values(&[channel.as_str()])
                    .set(delay.as_secs_f64());
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        debug!(channel = %channel, "Subscription cancelled");
    }
}

/// Why an open stream ended, from the peer's close frame.
fn close_cause(frame: Option<CloseFrame<'_>>) -> FeedError {
    let reason = match frame {
        Some(f) if !f.reason.is_empty() => format!("closed by peer ({}): {}", f.code, f.reason),
        Some(f) => format!("closed by peer ({})", f.code),
        None => "closed by peer".to_string(),
    };
    FeedError::StreamClosed(reason)
}

/// Decode a frame, logging and skipping it if malformed.
fn decode_or_skip(channel: &Channel, payload: &str) -> Option<Record> {
    match codec::decode_frame(payload) {
        Ok(record) => {
            #[cfg(feature = "metrics")]
            wxfeed_metrics::FRAMES_RECEIVED
                .with_label_values(&[channel.as_str()])
                .inc();
            Some(record)
        }
        Err(e) => {
            warn!(channel = %channel, error = %e, "Skipping malformed frame");
            count_decode_fault(channel);
            None
        }
    }
}

fn count_decode_fault(_channel: &Channel) {
    #[cfg(feature = "metrics")]
    wxfeed_metrics::DECODE_FAULTS
        .with_label_values(&[_channel.as_str()])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoCredentials;
    use crate::config::Endpoints;
    use std::time::Duration;

    #[test]
    fn test_close_cause_carries_reason() {
        use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "restarting".into(),
        };
        assert_eq!(
            close_cause(Some(frame)),
            FeedError::StreamClosed("closed by peer (1001): restarting".to_string())
        );
        assert_eq!(
            close_cause(None),
            FeedError::StreamClosed("closed by peer".to_string())
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SubscriptionState::RequestingTicket.to_string(), "requesting_ticket");
        assert_eq!(SubscriptionState::Streaming.to_string(), "streaming");
    }

    #[tokio::test]
    async fn test_subscription_is_lazy() {
        let config = ClientConfig::new(Endpoints::new("http://127.0.0.1:1", "ws://127.0.0.1:1"));
        let subscriber = Subscriber::new(&config, Arc::new(NoCredentials));
        let subscription = subscriber.subscribe("lazy".into(), CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(subscription.state(), SubscriptionState::Idle);
        assert_eq!(subscription.channel().as_str(), "lazy");
    }

    #[tokio::test]
    async fn test_cancelled_before_poll_ends_immediately() {
        let config = ClientConfig::new(Endpoints::new("http://127.0.0.1:1", "ws://127.0.0.1:1"));
        let subscriber = Subscriber::new(&config, Arc::new(NoCredentials));
        let mut subscription = subscriber.subscribe("gone".into(), CancellationToken::new());

        subscription.cancel();
        assert!(subscription.next().await.is_none());
    }
}
