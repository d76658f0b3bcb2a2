// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::GatewayError;
use super::feed::Subscription;
use crate::counts::CountSnapshot;
use crate::folders::FolderListing;

/// Mutating folder operations the panel can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderAction {
    MarkAllRead,
    Empty,
    Delete,
}

impl fmt::Display for FolderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FolderAction::MarkAllRead => "mark_all_read",
            FolderAction::Empty => "empty",
            FolderAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderActionRequest {
    pub action: FolderAction,
    pub folder_path: String,
    pub account_id: String,
}

/// Topic filter of a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    UnseenCounts,
    FolderList,
}

/// A single unseen-count change carried by the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountChange {
    pub path: String,
    #[serde(alias = "unseenCount")]
    pub unseen_count: u32,
}

impl CountChange {
    /// Parses a raw payload. Missing `path` or `unseen_count` is an error.
    pub fn from_payload(payload: &Value) -> Result<Self, GatewayError> {
        let change = CountChange::deserialize(payload)?;
        if change.path.is_empty() {
            return Err(GatewayError::Malformed("empty folder path".to_string()));
        }
        Ok(change)
    }
}

/// Request/response side of the mail protocol gateway.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Full folder listing of one account.
    async fn list_folders(&self, account_id: &str) -> Result<Vec<FolderListing>, GatewayError>;

    /// "Get all counts" snapshot: `path -> unseen_count`.
    async fn fetch_counts(&self, account_id: &str) -> Result<CountSnapshot, GatewayError>;

    async fn perform(&self, request: FolderActionRequest) -> Result<(), GatewayError>;
}

/// Push side: a per-account change feed.
pub trait LiveChannel: Send + Sync {
    fn subscribe(&self, account_id: &str, topic: Topic) -> Result<Subscription, GatewayError>;

    /// Returns true when the subscription existed.
    fn unsubscribe(&self, subscription_id: &str) -> bool;
}
