//! One live subscription per channel.
//!
//! Subscribing to a channel that already has a live subscription cancels the
//! old one first, including any reconnect it has pending.

use crate::ws::{Subscriber, Subscription};
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::info;
use wxfeed_types::Channel;

pub struct SubscriptionRegistry {
    subscriber: Subscriber,
    active: DashMap<Channel, CancellationToken>,
    root: CancellationToken,
}

impl SubscriptionRegistry {
    pub fn new(subscriber: Subscriber) -> Self {
        Self {
            subscriber,
            active: DashMap::new(),
            root: CancellationToken::new(),
        }
    }

    /// Start a subscription for `channel`, replacing any live one.
    pub fn subscribe(&self, channel: impl Into<Channel>) -> Subscription {
        let channel = channel.into();
        let token = self.root.child_token();

        if let Some(previous) = self.active.insert(channel.clone(), token.clone()) {
            if !previous.is_cancelled() {
                info!(channel = %channel, "Replacing live subscription");
                previous.cancel();
            }
        }

        self.subscriber.subscribe(channel, token)
    }

    /// Cancel the live subscription for `channel`. Returns whether one existed.
    pub fn unsubscribe(&self, channel: &Channel) -> bool {
        match self.active.remove(channel) {
            Some((_, token)) => {
                let was_live = !token.is_cancelled();
                token.cancel();
                was_live
            }
            None => false,
        }
    }

    pub fn is_active(&self, channel: &Channel) -> bool {
        self.active
            .get(channel)
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    /// Channels with a subscription that has not been cancelled, sorted.
    pub fn active_channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self
            .active
            .iter()
            .filter(|entry| !entry.value().is_cancelled())
            .map(|entry| entry.key().clone())
            .collect();
        channels.sort();
        channels
    }

    /// Cancel every subscription started through this registry.
    ///
    /// Subscriptions started after shutdown are born cancelled.
    pub fn shutdown(&self) {
        self.root.cancel();
        self.active.clear();
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoCredentials;
    use crate::config::{ClientConfig, Endpoints};
    use std::sync::Arc;

    fn registry() -> SubscriptionRegistry {
        let config = ClientConfig::new(Endpoints::new("http://127.0.0.1:1", "ws://127.0.0.1:1"));
        SubscriptionRegistry::new(Subscriber::new(&config, Arc::new(NoCredentials)))
    }

    #[tokio::test]
    async fn test_resubscribe_cancels_previous() {
        let registry = registry();
        let first = registry.subscribe("zero:sensor:BME280");
        let second = registry.subscribe("zero:sensor:BME280");

        assert!(first.cancellation_token().is_cancelled());
        assert!(!second.cancellation_token().is_cancelled());
        assert_eq!(registry.active_channels(), vec![Channel::from("zero:sensor:BME280")]);
    }

    #[tokio::test]
    async fn test_channels_are_independent() {
        let registry = registry();
        let a = registry.subscribe("a");
        let b = registry.subscribe("b");

        assert!(registry.unsubscribe(&Channel::from("a")));
        assert!(!registry.unsubscribe(&Channel::from("a")));
        assert!(a.cancellation_token().is_cancelled());
        assert!(!b.cancellation_token().is_cancelled());
        assert!(registry.is_active(&Channel::from("b")));
        assert!(!registry.is_active(&Channel::from("a")));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_everything() {
        let registry = registry();
        let a = registry.subscribe("a");
        let b = registry.subscribe("b");

        registry.shutdown();
        assert!(a.cancellation_token().is_cancelled());
        assert!(b.cancellation_token().is_cancelled());
        assert!(registry.active_channels().is_empty());
    }

    #[tokio::test]
    async fn test_externally_cancelled_subscription_not_listed() {
        let registry = registry();
        let a = registry.subscribe("a");
        a.cancel();
        assert!(registry.active_channels().is_empty());
    }
}
