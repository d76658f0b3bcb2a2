// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// End-to-end tests of the folder panel over the JSON file gateway.
// Run with: cargo test --test panel_integration

mod common;

use std::sync::Arc;

use mailpanel::config::Settings;
use mailpanel::error::PanelError;
use mailpanel::folders::ExpansionStore;
use mailpanel::gateway::FolderAction;
use mailpanel::panel::PanelView;
use tokio_util::sync::CancellationToken;

use common::{dotted_listing, snapshot, wait_for_revision, Harness};

fn rows(view: &PanelView) -> Vec<(String, usize, u32)> {
    view.rows
        .iter()
        .map(|r| (r.folder.display_name.clone(), r.level, r.unread))
        .collect()
}

fn row(name: &str, level: usize, unread: u32) -> (String, usize, u32) {
    (name.to_string(), level, unread)
}

#[tokio::test]
async fn test_tree_orders_system_folders_first_for_every_delimiter() {
    let h = Harness::new().await;
    h.add_both().await;

    let work = h.panel.render("work").await.unwrap();
    assert_eq!(
        rows(&work),
        vec![row("INBOX", 0, 4), row("Sent", 0, 0), row("Trash", 0, 1), row("Archive", 0, 0)]
    );
    assert!(work.rows[0].has_children);
    assert!(!work.rows[0].expanded);

    // `[Gmail]` and `Projects` are not listed, so their children become roots.
    let home = h.panel.render("home").await.unwrap();
    assert_eq!(
        rows(&home),
        vec![row("Inbox", 0, 7), row("drafts", 0, 0), row("Spam", 0, 0), row("2024", 0, 3)]
    );
    assert_eq!(home.rows[2].folder.path, "[Gmail]/Spam");
}

#[tokio::test]
async fn test_expansion_reveals_children_and_survives_restart() {
    let h = Harness::new().await;
    h.add_both().await;

    assert!(h.panel.toggle_expanded("work", "INBOX").await.unwrap());
    assert!(h.panel.toggle_expanded("work", "INBOX.Work").await.unwrap());
    let view = h.panel.render("work").await.unwrap();
    assert_eq!(
        rows(&view),
        vec![
            row("INBOX", 0, 4),
            row("Work", 1, 2),
            row("Reports", 2, 0),
            row("Sent", 0, 0),
            row("Trash", 0, 1),
            row("Archive", 0, 0),
        ]
    );

    // Collapsing the parent hides the grandchild even though Work stays expanded.
    assert!(!h.panel.toggle_expanded("work", "INBOX").await.unwrap());
    assert_eq!(h.panel.render("work").await.unwrap().rows.len(), 4);

    // Expansion is per account.
    assert!(!h.panel.expansion_store().is_expanded("home", "INBOX.Work").await);

    let reloaded = ExpansionStore::new(h.panel.expansion_store().storage_path());
    reloaded.initialize().await.unwrap();
    assert!(reloaded.is_expanded("work", "INBOX.Work").await);
    assert!(!reloaded.is_expanded("work", "INBOX").await);
}

#[tokio::test]
async fn test_inbox_badge_matches_inbox_row() {
    let h = Harness::new().await;
    h.panel.add_account("work", None).await.unwrap();
    // Counts spell the inbox "Inbox" while the account declares "INBOX".
    h.panel.add_account("home", None).await.unwrap();

    assert_eq!(h.panel.render("work").await.unwrap().inbox_unread, 4);

    let home = h.panel.render("home").await.unwrap();
    assert_eq!(home.rows[0].unread, 7);
    assert_eq!(home.inbox_unread, 7);
}

#[tokio::test]
async fn test_live_change_in_other_spelling_updates_inbox_row() {
    let h = Harness::new().await;
    h.add_both().await;
    h.panel.activate("work").unwrap();
    let work = h.panel.account("work").unwrap();
    let start = work.revision();

    // Snapshot reported "INBOX"; the live source spells it "Inbox".
    assert_eq!(h.feed.publish_count("work", "Inbox", 0), 1);
    wait_for_revision(&work, start + 1).await;

    let view = h.panel.render("work").await.unwrap();
    assert_eq!(view.rows[0].folder.path, "INBOX");
    assert_eq!(view.rows[0].unread, 0);
    assert_eq!(view.inbox_unread, 0);
}

#[tokio::test]
async fn test_live_changes_stay_within_their_account() {
    let h = Harness::new().await;
    h.add_both().await;
    h.panel.activate("work").unwrap();
    h.panel.activate("home").unwrap();

    let work = h.panel.account("work").unwrap();
    let home = h.panel.account("home").unwrap();
    let tree_before = work.tree().await.unwrap();
    let (work_rev, home_rev) = (work.revision(), home.revision());

    assert_eq!(h.feed.publish_count("work", "INBOX", 10), 1);
    wait_for_revision(&work, work_rev + 1).await;

    assert_eq!(h.panel.render("work").await.unwrap().inbox_unread, 10);
    assert_eq!(h.panel.render("home").await.unwrap().inbox_unread, 7);
    assert_eq!(home.revision(), home_rev);
    // Live changes never rebuild the tree.
    assert!(Arc::ptr_eq(&tree_before, &work.tree().await.unwrap()));
}

#[tokio::test]
async fn test_deactivated_view_ignores_changes() {
    let h = Harness::new().await;
    h.add_both().await;
    assert!(h.panel.activate("work").unwrap());
    assert!(h.panel.deactivate("work"));

    assert_eq!(h.feed.subscriber_count(), 0);
    assert_eq!(h.feed.publish_count("work", "INBOX", 10), 0);
    tokio::task::yield_now().await;
    assert_eq!(h.panel.render("work").await.unwrap().inbox_unread, 4);
}

#[tokio::test]
async fn test_malformed_payload_is_dropped() {
    let h = Harness::new().await;
    h.add_both().await;
    h.panel.activate("work").unwrap();
    let work = h.panel.account("work").unwrap();
    let start = work.revision();

    h.feed.publish(
        "work",
        mailpanel::gateway::Topic::UnseenCounts,
        serde_json::json!({ "path": "INBOX" }),
    );
    h.feed.publish_count("work", "Sent", 5);
    wait_for_revision(&work, start + 1).await;

    let view = h.panel.render("work").await.unwrap();
    assert_eq!(view.inbox_unread, 4);
    assert_eq!(view.rows[1].unread, 5);
    assert_eq!(work.revision(), start + 1);
}

#[tokio::test]
async fn test_snapshot_drops_entries_from_live_changes() {
    let h = Harness::new().await;
    h.add_both().await;
    h.panel.activate("work").unwrap();
    let work = h.panel.account("work").unwrap();
    let start = work.revision();

    h.feed.publish_count("work", "Deleted.Folder", 9);
    wait_for_revision(&work, start + 1).await;
    assert_eq!(work.counts().await.lookup_key("Deleted.Folder"), Some(9));

    work.refresh_counts().await.unwrap();
    let counts = work.counts().await;
    assert_eq!(counts.lookup_key("Deleted.Folder"), None);
    assert_eq!(counts.inbox_unread(), 4);
}

#[tokio::test]
async fn test_mark_all_read_refreshes_counts() {
    let h = Harness::new().await;
    h.add_both().await;
    h.panel.set_expanded("work", "INBOX", true).await.unwrap();

    h.panel.mark_all_read("work", "INBOX.Work").await.unwrap();

    let view = h.panel.render("work").await.unwrap();
    assert_eq!(view.rows[1].folder.path, "INBOX.Work");
    assert_eq!(view.rows[1].unread, 0);
    assert_eq!(view.inbox_unread, 4);
}

#[tokio::test]
async fn test_delete_refreshes_listing() {
    let h = Harness::new().await;
    h.add_both().await;
    h.panel.expand_all("work").await.unwrap();
    assert_eq!(h.panel.render("work").await.unwrap().rows.len(), 6);

    h.panel.delete("work", "INBOX.Work").await.unwrap();

    let view = h.panel.render("work").await.unwrap();
    assert_eq!(
        rows(&view),
        vec![row("INBOX", 0, 4), row("Sent", 0, 0), row("Trash", 0, 1), row("Archive", 0, 0)]
    );
    assert!(!view.rows[0].has_children);
}

#[tokio::test]
async fn test_failed_action_leaves_state_untouched() {
    let h = Harness::new().await;
    h.add_both().await;
    let work = h.panel.account("work").unwrap();
    let start = work.revision();

    let err = h.panel.empty("work", "Missing").await.unwrap_err();
    assert!(matches!(
        err,
        PanelError::ActionFailed { action: FolderAction::Empty, .. }
    ));
    assert_eq!(work.revision(), start);
    assert_eq!(h.panel.render("work").await.unwrap().rows.len(), 4);
}

#[tokio::test]
async fn test_removed_account_discards_pending_snapshot() {
    let h = Harness::new().await;
    h.add_both().await;
    let work = h.panel.account("work").unwrap();
    let start = work.revision();

    h.gateway
        .inner()
        .write_account("work", &dotted_listing(), &snapshot(&[("INBOX", 99)]))
        .await
        .unwrap();
    h.gateway.hold_counts(true);
    let pending = tokio::spawn({
        let work = work.clone();
        async move { work.refresh_counts().await }
    });
    h.gateway.count_requested.notified().await;

    h.panel.remove_account("work").unwrap();
    h.gateway.release_counts.notify_one();
    pending.await.unwrap().unwrap();

    assert_eq!(work.counts().await.inbox_unread(), 4);
    assert_eq!(work.revision(), start);
    assert_eq!(h.panel.accounts(), vec!["home".to_string()]);
}

#[tokio::test]
async fn test_failed_listing_offers_retry() {
    let h = Harness::new().await;
    h.gateway.fail_listing(true);
    h.panel.add_account("work", None).await.unwrap();

    let view = h.panel.render("work").await.unwrap();
    assert!(view.rows.is_empty());
    assert!(view.retryable);
    assert!(view.listing_error.unwrap().contains("server unreachable"));
    assert_eq!(view.inbox_unread, 4);

    assert!(h.panel.retry_listing("work").await.is_err());
    h.gateway.fail_listing(false);
    h.panel.retry_listing("work").await.unwrap();

    let view = h.panel.render("work").await.unwrap();
    assert!(!view.retryable);
    assert_eq!(view.rows.len(), 4);
}

#[tokio::test]
async fn test_background_poll_applies_new_snapshots() {
    let mut settings = Settings::default();
    settings.panel.poll_interval_secs = 1;
    let h = Harness::with_settings(settings).await;
    h.add_both().await;
    let work = h.panel.account("work").unwrap();
    let start = work.revision();

    h.gateway
        .inner()
        .write_account("work", &dotted_listing(), &snapshot(&[("INBOX", 12)]))
        .await
        .unwrap();

    let shutdown = CancellationToken::new();
    let poll = h.panel.clone().start_background_poll(shutdown.clone());
    wait_for_revision(&work, start + 1).await;
    assert_eq!(h.panel.render("work").await.unwrap().inbox_unread, 12);

    shutdown.cancel();
    poll.await.unwrap();
}
