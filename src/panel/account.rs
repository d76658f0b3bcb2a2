// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::counts::{AccountCounts, CountMap};
use crate::folders::{flatten, ExpansionState, Folder, FolderTree, SystemFolderPolicy};
use crate::gateway::{CountChange, GatewayError, MailGateway};

/// What the panel currently knows about an account's folder structure.
#[derive(Debug, Clone)]
pub enum ListingState {
    NotLoaded,
    Ready(Arc<FolderTree>),
    Failed {
        error: String,
        failed_at: DateTime<Utc>,
    },
}

/// One visible line of the folder panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRow {
    pub folder: Folder,
    pub level: usize,
    pub unread: u32,
    pub has_children: bool,
    pub expanded: bool,
}

/// Everything a renderer needs for one account.
#[derive(Debug, Clone)]
pub struct PanelView {
    pub account_id: String,
    pub rows: Vec<FolderRow>,
    pub inbox_unread: u32,
    pub loading: bool,
    pub listing_error: Option<String>,
    /// Set when the listing failed and a retry should be offered.
    pub retryable: bool,
}

#[derive(Debug)]
struct ListingSlot {
    state: ListingState,
    applied_ticket: u64,
}

/// Folder tree and unread counts of a single account.
///
/// Each account is refreshed independently; nothing here is locked across
/// accounts. Cancelling the account (on removal) makes every in-flight fetch
/// resolve to nothing.
pub struct AccountPanel {
    account_id: String,
    gateway: Arc<dyn MailGateway>,
    policy: Arc<SystemFolderPolicy>,
    request_timeout: Duration,
    listing: RwLock<ListingSlot>,
    next_listing_ticket: AtomicU64,
    counts: AccountCounts,
    cancel: CancellationToken,
    revision: watch::Sender<u64>,
}

impl AccountPanel {
    pub fn new(
        account_id: &str,
        inbox_path: &str,
        gateway: Arc<dyn MailGateway>,
        policy: Arc<SystemFolderPolicy>,
        request_timeout: Duration,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            account_id: account_id.to_string(),
            gateway,
            policy,
            request_timeout,
            listing: RwLock::new(ListingSlot {
                state: ListingState::NotLoaded,
                applied_ticket: 0,
            }),
            next_listing_ticket: AtomicU64::new(1),
            counts: AccountCounts::new(inbox_path),
            cancel: CancellationToken::new(),
            revision,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn inbox_path(&self) -> &str {
        self.counts.inbox_path()
    }

    /// Receiver bumped on every tree rebuild or count change.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    /// Stops all pending and future fetches from being applied.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs a gateway call bounded by the request timeout. `None` means the
    /// account was cancelled and the result must be ignored.
    async fn guarded<T, F>(&self, what: &str, call: F) -> Option<Result<T, GatewayError>>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = tokio::time::timeout(self.request_timeout, call) => {
                Some(result.unwrap_or_else(|elapsed| Err(elapsed.into())))
            }
        };
        if result.is_none() || self.is_cancelled() {
            debug!("Discarding {} result for removed account {}", what, self.account_id);
            return None;
        }
        result
    }

    /// Fetches the folder listing and rebuilds the tree wholesale.
    ///
    /// On failure the listing becomes `Failed` (rendered empty, retryable)
    /// and the error is returned for diagnostics.
    pub async fn refresh_listing(&self) -> Result<(), GatewayError> {
        let ticket = self.next_listing_ticket.fetch_add(1, Ordering::SeqCst);
        let Some(result) = self
            .guarded("listing", self.gateway.list_folders(&self.account_id))
            .await
        else {
            return Ok(());
        };

        match result {
            Ok(listings) => {
                let folders: Vec<Folder> = listings
                    .into_iter()
                    .map(|listing| Folder::from_listing(&self.account_id, listing))
                    .collect();
                let mut tree = FolderTree::build(&self.account_id, folders);
                tree.sort_with(&self.policy);
                let count = tree.len();
                if self.set_listing(ticket, ListingState::Ready(Arc::new(tree))).await {
                    info!("Rebuilt folder tree for {} ({} folders)", self.account_id, count);
                }
                Ok(())
            }
            Err(e) => {
                warn!("Folder listing failed for {}: {}", self.account_id, e);
                self.set_listing(
                    ticket,
                    ListingState::Failed {
                        error: e.to_string(),
                        failed_at: Utc::now(),
                    },
                )
                .await;
                Err(e)
            }
        }
    }

    async fn set_listing(&self, ticket: u64, state: ListingState) -> bool {
        {
            let mut slot = self.listing.write().await;
            if ticket < slot.applied_ticket {
                debug!("Discarding stale listing {} for {}", ticket, self.account_id);
                return false;
            }
            slot.state = state;
            slot.applied_ticket = ticket;
        }
        self.bump();
        true
    }

    /// Fetches the count snapshot and replaces the whole count map.
    ///
    /// Fails open: on error every count drops to zero and the error is
    /// returned for diagnostics only.
    pub async fn refresh_counts(&self) -> Result<(), GatewayError> {
        let ticket = self.counts.begin_snapshot();
        let Some(result) = self
            .guarded("count snapshot", self.gateway.fetch_counts(&self.account_id))
            .await
        else {
            return Ok(());
        };

        match result {
            Ok(snapshot) => {
                if self.counts.apply_snapshot(ticket, &snapshot).await {
                    debug!("Applied count snapshot for {} ({} folders)", self.account_id, snapshot.len());
                    self.bump();
                }
                Ok(())
            }
            Err(e) => {
                warn!("Count snapshot failed for {}, showing no badges: {}", self.account_id, e);
                if self.counts.reset(ticket).await {
                    self.bump();
                }
                Err(e)
            }
        }
    }

    /// Forces a refetch of both the listing and the count snapshot.
    pub async fn invalidate(&self) {
        let (listing, counts) = tokio::join!(self.refresh_listing(), self.refresh_counts());
        if let Err(e) = listing {
            debug!("Listing refresh after invalidation failed for {}: {}", self.account_id, e);
        }
        if let Err(e) = counts {
            debug!("Count refresh after invalidation failed for {}: {}", self.account_id, e);
        }
    }

    /// Merges a live count change. Never touches the tree.
    pub async fn apply_change(&self, change: &CountChange) {
        if self.is_cancelled() {
            return;
        }
        self.counts.apply_change(&change.path, change.unseen_count).await;
        self.bump();
    }

    pub async fn listing(&self) -> ListingState {
        self.listing.read().await.state.clone()
    }

    pub async fn tree(&self) -> Option<Arc<FolderTree>> {
        match &self.listing.read().await.state {
            ListingState::Ready(tree) => Some(Arc::clone(tree)),
            _ => None,
        }
    }

    pub async fn counts(&self) -> Arc<CountMap> {
        self.counts.current().await
    }

    pub async fn view(&self, expansion: &ExpansionState) -> PanelView {
        let counts = self.counts.current().await;
        let listing = self.listing().await;

        let (rows, loading, listing_error) = match &listing {
            ListingState::Ready(tree) => {
                let rows = flatten(tree, expansion)
                    .into_iter()
                    .map(|flat| FolderRow {
                        unread: counts.lookup(&flat.folder),
                        folder: flat.folder,
                        level: flat.level,
                        has_children: flat.has_children,
                        expanded: flat.expanded,
                    })
                    .collect();
                (rows, false, None)
            }
            ListingState::NotLoaded => (Vec::new(), true, None),
            ListingState::Failed { error, .. } => (Vec::new(), false, Some(error.clone())),
        };

        PanelView {
            account_id: self.account_id.clone(),
            rows,
            inbox_unread: counts.inbox_unread(),
            loading,
            retryable: listing_error.is_some(),
            listing_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::CountSnapshot;
    use crate::folders::FolderListing;
    use crate::gateway::MockMailGateway;

    fn listing() -> Vec<FolderListing> {
        vec![
            FolderListing::new("INBOX.Work").with_delimiter("."),
            FolderListing::new("INBOX").with_delimiter("."),
            FolderListing::new("Archive").with_delimiter("."),
        ]
    }

    fn counts(entries: &[(&str, u32)]) -> CountSnapshot {
        entries.iter().map(|(p, c)| (p.to_string(), *c)).collect()
    }

    fn panel(gateway: MockMailGateway) -> AccountPanel {
        AccountPanel::new(
            "acct",
            "INBOX",
            Arc::new(gateway),
            Arc::new(SystemFolderPolicy::default()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_refresh_and_view() {
        let mut gateway = MockMailGateway::new();
        gateway.expect_list_folders().returning(|_| Ok(listing()));
        gateway
            .expect_fetch_counts()
            .returning(|_| Ok(counts(&[("INBOX", 3), ("inbox/work", 2)])));
        let panel = panel(gateway);
        let changes = panel.subscribe_changes();

        panel.invalidate().await;
        assert!(changes.has_changed().unwrap());

        let mut expansion = ExpansionState::default();
        expansion.set_expanded("acct", "INBOX", true);
        let view = panel.view(&expansion).await;
        let rows: Vec<(&str, usize, u32)> = view
            .rows
            .iter()
            .map(|r| (r.folder.path.as_str(), r.level, r.unread))
            .collect();
        assert_eq!(rows, vec![("INBOX", 0, 3), ("INBOX.Work", 1, 2), ("Archive", 0, 0)]);
        assert_eq!(view.inbox_unread, 3);
        assert!(!view.loading && !view.retryable);
    }

    #[tokio::test]
    async fn test_listing_failure_renders_empty_and_retryable() {
        let mut gateway = MockMailGateway::new();
        gateway
            .expect_list_folders()
            .returning(|_| Err(GatewayError::Connection("refused".to_string())));
        let panel = panel(gateway);

        assert!(panel.refresh_listing().await.is_err());
        let view = panel.view(&ExpansionState::default()).await;
        assert!(view.rows.is_empty());
        assert!(view.retryable);
        assert!(view.listing_error.unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn test_count_failure_fails_open() {
        let mut gateway = MockMailGateway::new();
        let mut calls = 0;
        gateway.expect_fetch_counts().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(counts(&[("INBOX", 7)]))
            } else {
                Err(GatewayError::Timeout("slow".to_string()))
            }
        });
        let panel = panel(gateway);

        panel.refresh_counts().await.unwrap();
        assert_eq!(panel.counts().await.inbox_unread(), 7);
        assert!(panel.refresh_counts().await.is_err());
        assert_eq!(panel.counts().await.inbox_unread(), 0);
    }

    #[tokio::test]
    async fn test_live_change_does_not_rebuild_tree() {
        let mut gateway = MockMailGateway::new();
        gateway.expect_list_folders().times(1).returning(|_| Ok(listing()));
        let panel = panel(gateway);
        panel.refresh_listing().await.unwrap();
        let before = panel.tree().await.unwrap();

        panel
            .apply_change(&CountChange {
                path: "INBOX".to_string(),
                unseen_count: 4,
            })
            .await;
        let after = panel.tree().await.unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(panel.counts().await.inbox_unread(), 4);
    }

    #[tokio::test]
    async fn test_cancelled_account_ignores_results() {
        let mut gateway = MockMailGateway::new();
        gateway.expect_list_folders().returning(|_| Ok(listing()));
        gateway.expect_fetch_counts().returning(|_| Ok(counts(&[("INBOX", 1)])));
        let panel = panel(gateway);

        panel.cancel();
        panel.invalidate().await;
        assert!(matches!(panel.listing().await, ListingState::NotLoaded));
        assert!(panel.counts().await.is_empty());
        assert_eq!(panel.revision(), 0);
    }
}
