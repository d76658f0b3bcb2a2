// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-account folder panel.
//!
//! `FolderPanel` owns one [`AccountPanel`] per registered account, the shared
//! expansion store, and the live subscriptions of active account views.

pub mod account;
pub mod dispatcher;
pub mod listener;

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::join_all;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

pub use account::{AccountPanel, FolderRow, ListingState, PanelView};
pub use dispatcher::FolderActionDispatcher;
pub use listener::{apply_message, LiveSubscription};

use crate::config::Settings;
use crate::error::{PanelError, Result};
use crate::folders::{AccountId, ExpansionStore, SystemFolderPolicy};
use crate::gateway::{LiveChannel, MailGateway};

pub struct FolderPanel {
    gateway: Arc<dyn MailGateway>,
    channel: Arc<dyn LiveChannel>,
    expansion: Arc<ExpansionStore>,
    policy: Arc<SystemFolderPolicy>,
    dispatcher: FolderActionDispatcher,
    accounts: DashMap<AccountId, Arc<AccountPanel>>,
    live: DashMap<AccountId, LiveSubscription>,
    default_inbox_path: String,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl FolderPanel {
    pub fn new(
        settings: &Settings,
        gateway: Arc<dyn MailGateway>,
        channel: Arc<dyn LiveChannel>,
        expansion: Arc<ExpansionStore>,
    ) -> Self {
        let request_timeout = settings.request_timeout();
        Self {
            dispatcher: FolderActionDispatcher::new(gateway.clone(), request_timeout),
            gateway,
            channel,
            expansion,
            policy: Arc::new(settings.system_folder_policy()),
            accounts: DashMap::new(),
            live: DashMap::new(),
            default_inbox_path: settings.panel.inbox_path.clone(),
            poll_interval: settings.poll_interval(),
            request_timeout,
        }
    }

    pub fn expansion_store(&self) -> &Arc<ExpansionStore> {
        &self.expansion
    }

    /// Registers an account and loads its listing and counts.
    ///
    /// Load failures are recorded in the account's state, not returned.
    pub async fn add_account(
        &self,
        account_id: &str,
        inbox_path: Option<&str>,
    ) -> Result<Arc<AccountPanel>> {
        let panel = match self.accounts.entry(account_id.to_string()) {
            Entry::Occupied(_) => return Err(PanelError::AccountExists(account_id.to_string())),
            Entry::Vacant(slot) => {
                let panel = Arc::new(AccountPanel::new(
                    account_id,
                    inbox_path.unwrap_or(&self.default_inbox_path),
                    self.gateway.clone(),
                    self.policy.clone(),
                    self.request_timeout,
                ));
                slot.insert(panel.clone());
                panel
            }
        };
        info!("Registered account {} (inbox {})", account_id, panel.inbox_path());

        panel.invalidate().await;
        Ok(panel)
    }

    /// Unregisters an account. Pending fetches for it are discarded and its
    /// live subscription is released. Expansion state is kept.
    pub fn remove_account(&self, account_id: &str) -> Result<()> {
        self.deactivate(account_id);
        let (_, panel) = self
            .accounts
            .remove(account_id)
            .ok_or_else(|| PanelError::UnknownAccount(account_id.to_string()))?;
        panel.cancel();
        info!("Removed account {}", account_id);
        Ok(())
    }

    pub fn accounts(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.accounts.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn account(&self, account_id: &str) -> Result<Arc<AccountPanel>> {
        self.accounts
            .get(account_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PanelError::UnknownAccount(account_id.to_string()))
    }

    /// Subscribes the account view to live count changes. Returns false if
    /// it was already active.
    pub fn activate(&self, account_id: &str) -> Result<bool> {
        let panel = self.account(account_id)?;
        match self.live.entry(account_id.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                let subscription = LiveSubscription::start(self.channel.clone(), panel)?;
                slot.insert(subscription);
                Ok(true)
            }
        }
    }

    /// Releases the account's live subscription. Returns false if none existed.
    pub fn deactivate(&self, account_id: &str) -> bool {
        match self.live.remove(account_id) {
            Some((_, subscription)) => {
                subscription.release();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, account_id: &str) -> bool {
        self.live.contains_key(account_id)
    }

    pub async fn render(&self, account_id: &str) -> Result<PanelView> {
        let panel = self.account(account_id)?;
        let expansion = self.expansion.snapshot().await;
        Ok(panel.view(&expansion).await)
    }

    /// Refetches the listing after a failure.
    pub async fn retry_listing(&self, account_id: &str) -> Result<()> {
        let panel = self.account(account_id)?;
        panel.refresh_listing().await?;
        Ok(())
    }

    /// Refetches both listing and counts; failures stay in the account state.
    pub async fn refresh(&self, account_id: &str) -> Result<()> {
        self.account(account_id)?.invalidate().await;
        Ok(())
    }

    /// Count snapshot for every account, fetched concurrently.
    pub async fn refresh_all_counts(&self) {
        let panels: Vec<Arc<AccountPanel>> = self.accounts.iter().map(|e| e.value().clone()).collect();
        let results = join_all(panels.iter().map(|panel| panel.refresh_counts())).await;
        for (panel, result) in panels.iter().zip(results) {
            if let Err(e) = result {
                warn!("Count poll failed for {}: {}", panel.account_id(), e);
            }
        }
    }

    pub async fn toggle_expanded(&self, account_id: &str, path: &str) -> Result<bool> {
        self.account(account_id)?;
        let expanded = self.expansion.toggle(account_id, path).await?;
        debug!("{} {} for {}", if expanded { "Expanded" } else { "Collapsed" }, path, account_id);
        Ok(expanded)
    }

    pub async fn set_expanded(&self, account_id: &str, path: &str, expanded: bool) -> Result<()> {
        self.account(account_id)?;
        self.expansion.set_expanded(account_id, path, expanded).await?;
        Ok(())
    }

    /// Expands every folder that has children.
    pub async fn expand_all(&self, account_id: &str) -> Result<()> {
        let panel = self.account(account_id)?;
        let Some(tree) = panel.tree().await else {
            return Ok(());
        };
        let parents: Vec<&str> = tree
            .folders()
            .into_iter()
            .filter(|f| tree.has_children(&f.path))
            .map(|f| f.path.as_str())
            .collect();
        self.expansion.set_many(account_id, parents, true).await?;
        Ok(())
    }

    pub async fn collapse_all(&self, account_id: &str) -> Result<()> {
        self.account(account_id)?;
        self.expansion.forget_account(account_id).await?;
        Ok(())
    }

    /// Drops persisted expansion state of an account, registered or not.
    pub async fn forget_account(&self, account_id: &str) -> Result<()> {
        self.expansion.forget_account(account_id).await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, account_id: &str, path: &str) -> Result<()> {
        let panel = self.account(account_id)?;
        self.dispatcher.mark_all_read(&panel, path).await
    }

    pub async fn empty(&self, account_id: &str, path: &str) -> Result<()> {
        let panel = self.account(account_id)?;
        self.dispatcher.empty(&panel, path).await
    }

    pub async fn delete(&self, account_id: &str, path: &str) -> Result<()> {
        let panel = self.account(account_id)?;
        self.dispatcher.delete(&panel, path).await
    }

    /// Polls count snapshots for all accounts until `shutdown` fires.
    pub fn start_background_poll(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = time::interval(self.poll_interval);
            interval.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Background count poll stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        debug!("Polling counts for {} accounts", self.accounts.len());
                        self.refresh_all_counts().await;
                    }
                }
            }
        })
    }

    /// Releases every subscription and cancels all accounts.
    pub fn shutdown(&self) {
        let ids = self.accounts();
        for id in ids {
            if let Err(e) = self.remove_account(&id) {
                error!("Failed to remove account {} on shutdown: {}", id, e);
            }
        }
    }
}
