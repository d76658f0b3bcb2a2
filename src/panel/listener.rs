// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::task::JoinHandle;

use super::account::AccountPanel;
use crate::gateway::{CountChange, FeedMessage, GatewayError, LiveChannel, Topic};

/// Live unseen-count subscription of one active account view.
///
/// Created once when the view activates and released exactly once when it
/// deactivates. After `release` no message can reach the account panel.
pub struct LiveSubscription {
    account_id: String,
    subscription_id: String,
    channel: Arc<dyn LiveChannel>,
    task: Option<JoinHandle<()>>,
}

impl LiveSubscription {
    /// Subscribes to the account's count topic and starts applying changes.
    pub fn start(
        channel: Arc<dyn LiveChannel>,
        panel: Arc<AccountPanel>,
    ) -> Result<Self, GatewayError> {
        let account_id = panel.account_id().to_string();
        let mut subscription = channel.subscribe(&account_id, Topic::UnseenCounts)?;
        let subscription_id = subscription.id().to_string();
        info!("Listening for count changes on {} ({})", account_id, subscription_id);

        let task = tokio::spawn(async move {
            while let Some(message) = subscription.recv().await {
                apply_message(&panel, message).await;
            }
            debug!("Live feed closed for {}", panel.account_id());
        });

        Ok(Self {
            account_id,
            subscription_id,
            channel,
            task: Some(task),
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// Unsubscribes and stops the delivery task.
    pub fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            if !self.channel.unsubscribe(&self.subscription_id) {
                debug!("Subscription {} was already gone", self.subscription_id);
            }
            task.abort();
            info!("Stopped listening for count changes on {}", self.account_id);
        }
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        if self.task.is_some() {
            warn!(
                "Live subscription {} for {} dropped without release",
                self.subscription_id, self.account_id
            );
            self.shutdown();
        }
    }
}

/// Applies one feed message to the panel. Returns false when it was dropped.
pub async fn apply_message(panel: &AccountPanel, message: FeedMessage) -> bool {
    if message.account_id != panel.account_id() || message.topic != Topic::UnseenCounts {
        warn!(
            "Ignoring {:?} change for {} delivered to {}",
            message.topic,
            message.account_id,
            panel.account_id()
        );
        return false;
    }

    match CountChange::from_payload(&message.payload) {
        Ok(change) => {
            debug!(
                "Live count change for {}: {} -> {}",
                panel.account_id(),
                change.path,
                change.unseen_count
            );
            panel.apply_change(&change).await;
            true
        }
        Err(e) => {
            warn!(
                "Dropping malformed count change for {}: {} ({})",
                panel.account_id(),
                e,
                message.payload
            );
            false
        }
    }
}
