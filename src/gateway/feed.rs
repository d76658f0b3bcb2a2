// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// In-process live change feed.
//
// Producers (an IDLE bridge, a push listener, tests) publish raw JSON
// payloads for an account and topic; each subscriber only receives messages
// matching its own account and topic filter. Subscriptions are released
// explicitly through `unsubscribe`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::error::GatewayError;
use super::types::{LiveChannel, Topic};

/// One message delivered to a subscriber.
#[derive(Debug, Clone)]
pub struct FeedMessage {
    pub account_id: String,
    pub topic: Topic,
    pub payload: Value,
    pub published_at: DateTime<Utc>,
}

// Subscription handle
#[derive(Debug)]
pub struct Subscription {
    id: String,
    account_id: String,
    topic: Topic,
    receiver: mpsc::UnboundedReceiver<FeedMessage>,
}

impl Subscription {
    pub fn new(
        id: String,
        account_id: String,
        topic: Topic,
        receiver: mpsc::UnboundedReceiver<FeedMessage>,
    ) -> Self {
        Self {
            id,
            account_id,
            topic,
            receiver,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Next message, or `None` once the channel side has been dropped.
    pub async fn recv(&mut self) -> Option<FeedMessage> {
        self.receiver.recv().await
    }
}

struct Subscriber {
    account_id: String,
    topic: Topic,
    sender: mpsc::UnboundedSender<FeedMessage>,
}

#[derive(Clone, Default)]
pub struct ChangeFeed {
    subscribers: Arc<DashMap<String, Subscriber>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a payload to every matching subscriber; returns how many
    /// received it.
    pub fn publish(&self, account_id: &str, topic: Topic, payload: Value) -> usize {
        let message = FeedMessage {
            account_id: account_id.to_string(),
            topic,
            payload,
            published_at: Utc::now(),
        };
        debug!("Publishing {:?} change for {}", topic, account_id);

        let mut delivered = 0;
        let mut failed_subscribers = Vec::new();
        for entry in self.subscribers.iter() {
            let subscriber = entry.value();
            if subscriber.account_id != account_id || subscriber.topic != topic {
                continue;
            }
            match subscriber.sender.send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Failed to send change to subscriber {}: {}", entry.key(), e);
                    failed_subscribers.push(entry.key().clone());
                }
            }
        }

        // Removal happens after iteration so no shard lock is held twice.
        for id in failed_subscribers {
            self.subscribers.remove(&id);
            warn!("Removed failed subscriber: {}", id);
        }
        delivered
    }

    /// Convenience for the common unseen-count change.
    pub fn publish_count(&self, account_id: &str, path: &str, unseen_count: u32) -> usize {
        self.publish(
            account_id,
            Topic::UnseenCounts,
            json!({ "path": path, "unseen_count": unseen_count }),
        )
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn subscriber_count_for(&self, account_id: &str) -> usize {
        self.subscribers
            .iter()
            .filter(|entry| entry.value().account_id == account_id)
            .count()
    }
}

impl LiveChannel for ChangeFeed {
    fn subscribe(&self, account_id: &str, topic: Topic) -> Result<Subscription, GatewayError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4().to_string();

        self.subscribers.insert(
            id.clone(),
            Subscriber {
                account_id: account_id.to_string(),
                topic,
                sender: tx,
            },
        );
        info!("New {:?} subscription {} for {}", topic, id, account_id);

        Ok(Subscription::new(id, account_id.to_string(), topic, rx))
    }

    fn unsubscribe(&self, subscription_id: &str) -> bool {
        if self.subscribers.remove(subscription_id).is_some() {
            info!("Subscription removed: {}", subscription_id);
            true
        } else {
            false
        }
    }
}
