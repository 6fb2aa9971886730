//! Live fan-out of sold-set snapshots
//!
//! The `Broadcaster` owns the registry of live subscribers and pushes the
//! full sold set to each of them. It is safe to share behind an `Arc` and to
//! call from any task:
//! - `subscribe`/`unsubscribe` take a short write lock on the registry
//! - `publish` copies the registrations under a read lock, releases it, and
//!   only then performs delivery, so churn during a publish never affects
//!   iteration
//! - every delivery runs concurrently and is bounded by `delivery_timeout`;
//!   a slow or failing subscriber is logged and skipped without delaying the
//!   others
//!
//! A subscriber is dropped from the registry only when its connection is
//! gone (the channel is closed or its weak sender can no longer be
//! upgraded). A timeout alone does not unsubscribe it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::future::join_all;
use tokio::time::timeout;
use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::message::Snapshot;
use crate::broker::ticket::SoldSet;
use crate::client::{Subscriber, SubscriberId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Delivered,
    TimedOut,
    Closed,
}

#[derive(Debug)]
pub struct Broadcaster {
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    delivery_timeout: Duration,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELIVERY_TIMEOUT)
    }
}

impl Broadcaster {
    /// Upper bound for pushing one snapshot to one subscriber.
    pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            delivery_timeout,
        }
    }

    // The map stays structurally valid even if a holder panicked.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<SubscriberId, Subscriber>> {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SubscriberId, Subscriber>> {
        self.subscribers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a subscriber for all subsequent publishes.
    pub fn subscribe(&self, subscriber: Subscriber) {
        debug!(subscriber = %subscriber.id, "subscribed");
        self.write().insert(subscriber.id.clone(), subscriber);
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: &SubscriberId) {
        if self.write().remove(id).is_some() {
            debug!(subscriber = %id, "unsubscribed");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().len()
    }

    pub fn is_subscribed(&self, id: &SubscriberId) -> bool {
        self.read().contains_key(id)
    }

    /// Push `sold` to every registered subscriber.
    pub async fn publish(&self, sold: &SoldSet) {
        let Some(msg) = render(sold) else {
            return;
        };

        let targets: Vec<Subscriber> = self.read().values().cloned().collect();
        if targets.is_empty() {
            debug!(sold = sold.len(), "no subscribers to publish to");
            return;
        }

        let outcomes = join_all(
            targets
                .into_iter()
                .map(|subscriber| self.deliver(subscriber, msg.clone())),
        )
        .await;

        let delivered = outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == Delivery::Delivered)
            .count();
        self.prune(outcomes);

        debug!(sold = sold.len(), delivered, "published snapshot");
    }

    /// Push `sold` to a single subscriber, with the same isolation rules as
    /// `publish`.
    pub async fn send_to(&self, id: &SubscriberId, sold: &SoldSet) {
        let Some(subscriber) = self.read().get(id).cloned() else {
            debug!(subscriber = %id, "not subscribed; snapshot dropped");
            return;
        };
        let Some(msg) = render(sold) else {
            return;
        };

        let outcome = self.deliver(subscriber, msg).await;
        self.prune(vec![outcome]);
    }

    async fn deliver(&self, subscriber: Subscriber, msg: WsMessage) -> (SubscriberId, Delivery) {
        let outcome = match subscriber.sender() {
            None => Delivery::Closed,
            Some(sender) => match timeout(self.delivery_timeout, sender.send(msg)).await {
                Ok(Ok(())) => Delivery::Delivered,
                Ok(Err(_)) => Delivery::Closed,
                Err(_) => {
                    warn!(
                        subscriber = %subscriber.id,
                        timeout_ms = self.delivery_timeout.as_millis() as u64,
                        "snapshot delivery timed out; skipping"
                    );
                    Delivery::TimedOut
                }
            },
        };
        (subscriber.id, outcome)
    }

    fn prune(&self, outcomes: Vec<(SubscriberId, Delivery)>) {
        let closed: Vec<SubscriberId> = outcomes
            .into_iter()
            .filter(|(_, outcome)| *outcome == Delivery::Closed)
            .map(|(id, _)| id)
            .collect();
        if closed.is_empty() {
            return;
        }

        let mut subscribers = self.write();
        for id in closed {
            if subscribers.remove(&id).is_some() {
                debug!(subscriber = %id, "connection gone; removed subscriber");
            }
        }
    }
}

fn render(sold: &SoldSet) -> Option<WsMessage> {
    match Snapshot::of(sold).to_ws_message() {
        Ok(msg) => Some(msg),
        Err(e) => {
            error!("Failed to serialize snapshot: {e}");
            None
        }
    }
}
