// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use mailpanel::config::Settings;
use mailpanel::counts::CountSnapshot;
use mailpanel::folders::{ExpansionStore, FolderListing};
use mailpanel::gateway::{
    ChangeFeed, FolderActionRequest, GatewayError, JsonFileGateway, MailGateway,
};
use mailpanel::panel::{AccountPanel, FolderPanel};

pub fn snapshot(entries: &[(&str, u32)]) -> CountSnapshot {
    entries.iter().map(|(p, c)| (p.to_string(), *c)).collect()
}

/// Dot-delimited account with a nested work folder.
pub fn dotted_listing() -> Vec<FolderListing> {
    vec![
        FolderListing::new("INBOX").with_delimiter("."),
        FolderListing::new("INBOX.Work").with_delimiter("."),
        FolderListing::new("INBOX.Work.Reports").with_delimiter("."),
        FolderListing::new("Archive").with_delimiter("."),
        FolderListing::new("Sent").with_delimiter("."),
        FolderListing::new("Trash").with_delimiter("."),
    ]
}

/// Slash-delimited account using provider-style names.
pub fn slashed_listing() -> Vec<FolderListing> {
    vec![
        FolderListing::new("[Gmail]/Spam").with_delimiter("/").with_name("Spam"),
        FolderListing::new("Inbox").with_delimiter("/"),
        FolderListing::new("Projects/2024").with_delimiter("/"),
        FolderListing::new("drafts").with_delimiter("/"),
    ]
}

/// Wraps the file gateway so tests can hold count fetches and fail listings.
pub struct ControlledGateway {
    inner: JsonFileGateway,
    hold_counts: AtomicBool,
    fail_listing: AtomicBool,
    pub count_requested: Notify,
    pub release_counts: Notify,
}

impl ControlledGateway {
    pub fn new(inner: JsonFileGateway) -> Self {
        Self {
            inner,
            hold_counts: AtomicBool::new(false),
            fail_listing: AtomicBool::new(false),
            count_requested: Notify::new(),
            release_counts: Notify::new(),
        }
    }

    pub fn inner(&self) -> &JsonFileGateway {
        &self.inner
    }

    pub fn hold_counts(&self, hold: bool) {
        self.hold_counts.store(hold, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MailGateway for ControlledGateway {
    async fn list_folders(&self, account_id: &str) -> Result<Vec<FolderListing>, GatewayError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(GatewayError::Connection("server unreachable".to_string()));
        }
        self.inner.list_folders(account_id).await
    }

    async fn fetch_counts(&self, account_id: &str) -> Result<CountSnapshot, GatewayError> {
        if self.hold_counts.load(Ordering::SeqCst) {
            self.count_requested.notify_one();
            self.release_counts.notified().await;
        }
        self.inner.fetch_counts(account_id).await
    }

    async fn perform(&self, request: FolderActionRequest) -> Result<(), GatewayError> {
        self.inner.perform(request).await
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub gateway: Arc<ControlledGateway>,
    pub feed: Arc<ChangeFeed>,
    pub panel: Arc<FolderPanel>,
}

impl Harness {
    /// Seeds `work` (dot-delimited) and `home` (slash-delimited) accounts.
    pub async fn new() -> Self {
        Self::with_settings(Settings::default()).await
    }

    pub async fn with_settings(mut settings: Settings) -> Self {
        let dir = TempDir::new().unwrap();
        let files = JsonFileGateway::new(dir.path().join("accounts"));
        files
            .write_account(
                "work",
                &dotted_listing(),
                &snapshot(&[("INBOX", 4), ("INBOX.Work", 2), ("Trash", 1)]),
            )
            .await
            .unwrap();
        files
            .write_account(
                "home",
                &slashed_listing(),
                &snapshot(&[("Inbox", 7), ("projects.2024", 3)]),
            )
            .await
            .unwrap();

        settings.panel.expansion_state_path = Some(dir.path().join("state").join("expanded.json"));
        let store = Arc::new(ExpansionStore::new(settings.expansion_state_path()));
        store.initialize().await.unwrap();

        let gateway = Arc::new(ControlledGateway::new(files));
        let feed = Arc::new(ChangeFeed::new());
        let panel = Arc::new(FolderPanel::new(&settings, gateway.clone(), feed.clone(), store));

        Self {
            dir,
            gateway,
            feed,
            panel,
        }
    }

    pub async fn add_both(&self) {
        self.panel.add_account("work", None).await.unwrap();
        self.panel.add_account("home", Some("Inbox")).await.unwrap();
    }
}

/// Waits until the account's revision reaches `revision`.
pub async fn wait_for_revision(account: &AccountPanel, revision: u64) {
    let mut changes = account.subscribe_changes();
    tokio::time::timeout(Duration::from_secs(5), changes.wait_for(|r| *r >= revision))
        .await
        .expect("timed out waiting for panel change")
        .unwrap();
}
