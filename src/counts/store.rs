// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use tokio::sync::RwLock;

use super::map::{CountMap, CountSnapshot};

/// Issued when a snapshot fetch starts. Only the newest ticket may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotTicket(u64);

#[derive(Debug)]
struct CountState {
    map: Arc<CountMap>,
    applied_ticket: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Live count state of a single account.
///
/// Holds the current immutable [`CountMap`] and swaps it for a new one on
/// every snapshot or live change. Nothing here is shared across accounts.
#[derive(Debug)]
pub struct AccountCounts {
    inbox_path: String,
    next_ticket: AtomicU64,
    state: RwLock<CountState>,
}

impl AccountCounts {
    pub fn new(inbox_path: &str) -> Self {
        Self {
            inbox_path: inbox_path.to_string(),
            next_ticket: AtomicU64::new(1),
            state: RwLock::new(CountState {
                map: Arc::new(CountMap::empty(inbox_path)),
                applied_ticket: 0,
                refreshed_at: None,
            }),
        }
    }

    pub fn begin_snapshot(&self) -> SnapshotTicket {
        SnapshotTicket(self.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    /// Replaces the whole map with a fresh snapshot.
    ///
    /// Returns false when a newer snapshot already landed; the stale result
    /// is dropped.
    pub async fn apply_snapshot(&self, ticket: SnapshotTicket, snapshot: &CountSnapshot) -> bool {
        let map = CountMap::from_snapshot(&self.inbox_path, snapshot);
        self.replace(ticket, map).await
    }

    /// Fail-open: forget every count so no badges are shown.
    pub async fn reset(&self, ticket: SnapshotTicket) -> bool {
        self.replace(ticket, CountMap::empty(&self.inbox_path)).await
    }

    async fn replace(&self, ticket: SnapshotTicket, map: CountMap) -> bool {
        let mut state = self.state.write().await;
        if ticket.0 < state.applied_ticket {
            debug!(
                "Discarding stale count snapshot {} (already at {})",
                ticket.0, state.applied_ticket
            );
            return false;
        }
        state.map = Arc::new(map);
        state.applied_ticket = ticket.0;
        state.refreshed_at = Some(Utc::now());
        true
    }

    /// Merges one live change. Last write per path wins.
    pub async fn apply_change(&self, path: &str, count: u32) {
        let mut state = self.state.write().await;
        let next = state.map.with_change(path, count);
        state.map = Arc::new(next);
    }

    pub async fn current(&self) -> Arc<CountMap> {
        Arc::clone(&self.state.read().await.map)
    }

    pub async fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.refreshed_at
    }

    pub fn inbox_path(&self) -> &str {
        &self.inbox_path
    }
}
