// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

use super::path;

/// Identifier of a configured mail account.
pub type AccountId = String;

/// One entry of a server folder listing, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderListing {
    pub path: String,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Server-reported depth. Rendering hint only.
    #[serde(default)]
    pub level: Option<u32>,
}

impl FolderListing {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: None,
            display_name: None,
            name: None,
            level: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A folder of one account, keyed by its provider-native path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub account_id: AccountId,
    pub path: String,
    pub delimiter: Option<char>,
    pub display_name: String,
    pub name: String,
    pub level_hint: Option<u32>,
}

impl Folder {
    /// Stamps a listing entry with its account, filling absent names from the
    /// last path segment.
    pub fn from_listing(account_id: &str, listing: FolderListing) -> Self {
        let delimiter = listing.delimiter.as_deref().and_then(|d| d.chars().next());
        let separator = path::separator_for(&listing.path, delimiter);
        let leaf = path::leaf_name(&listing.path, separator).to_string();

        let name = listing
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| leaf.clone());
        let display_name = listing
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| name.clone());

        Self {
            account_id: account_id.to_string(),
            path: listing.path,
            delimiter,
            display_name,
            name,
            level_hint: listing.level,
        }
    }

    pub fn separator(&self) -> char {
        path::separator_for(&self.path, self.delimiter)
    }

    pub fn normalized_path(&self) -> String {
        path::normalize(&self.path)
    }

    /// Raw parent path derived from containment, before checking it exists.
    pub fn parent_path(&self) -> Option<&str> {
        path::parent_path(&self.path, self.separator())
    }
}

/// Composite identity of a folder across accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderKey {
    pub account_id: AccountId,
    pub path: String,
}

impl FolderKey {
    pub fn new(account_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            path: path.into(),
        }
    }
}

/// A folder positioned in the render sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatFolder {
    pub folder: Folder,
    pub level: usize,
    pub has_children: bool,
    pub expanded: bool,
}
