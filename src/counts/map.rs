// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Multi-keyed unread count lookup.
//!
//! The folder listing and the count source spell the same folder
//! differently (case, delimiter). Every count is therefore written under its
//! raw path and its normalized path in one shared key set; the account's
//! distinguished inbox is additionally written under the bare `INBOX` alias.

use std::collections::HashMap;

use crate::folders::path::normalize;
use crate::folders::types::Folder;

/// Bare alias for the account's distinguished inbox.
pub const INBOX_ALIAS: &str = "INBOX";

/// Raw `path -> unseen_count` association returned by a count snapshot.
pub type CountSnapshot = HashMap<String, u32>;

/// Immutable count lookup for one account.
///
/// Built wholesale from a snapshot; live changes produce a new map through
/// [`CountMap::with_change`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMap {
    inbox_path: String,
    keys: HashMap<String, u32>,
}

impl CountMap {
    pub fn empty(inbox_path: &str) -> Self {
        Self {
            inbox_path: inbox_path.to_string(),
            ..Self::default()
        }
    }

    /// Derived keys (normalized, alias) go in first, then every raw path, so
    /// a literal path reported by the snapshot is never shadowed by another
    /// entry's normalized twin.
    pub fn from_snapshot(inbox_path: &str, snapshot: &CountSnapshot) -> Self {
        let mut map = Self::empty(inbox_path);
        // Sorted so normalized collisions resolve the same way every time.
        let mut entries: Vec<(&String, &u32)> = snapshot.iter().collect();
        entries.sort();
        for (path, count) in &entries {
            map.insert_derived(path, **count);
        }
        for (path, count) in entries {
            map.keys.insert(path.clone(), *count);
        }
        map
    }

    /// Returns a copy of this map with one count merged in: raw path, then
    /// normalized path, then the inbox alias.
    pub fn with_change(&self, path: &str, count: u32) -> Self {
        let mut next = self.clone();
        next.keys.insert(path.to_string(), count);
        next.insert_derived(path, count);
        next
    }

    fn insert_derived(&mut self, path: &str, count: u32) {
        self.keys.insert(normalize(path), count);
        if path == self.inbox_path {
            self.keys.insert(INBOX_ALIAS.to_string(), count);
        }
    }

    /// Count for a rendered folder: exact path, then normalized path, then
    /// bare name. Missing folders count as zero.
    pub fn lookup(&self, folder: &Folder) -> u32 {
        self.keys
            .get(&folder.path)
            .or_else(|| self.keys.get(&normalize(&folder.path)))
            .or_else(|| self.keys.get(&folder.name))
            .copied()
            .unwrap_or(0)
    }

    pub fn lookup_key(&self, key: &str) -> Option<u32> {
        self.keys.get(key).copied()
    }

    /// Badge for the account header.
    pub fn inbox_unread(&self) -> u32 {
        self.lookup_key(INBOX_ALIAS).unwrap_or(0)
    }

    pub fn inbox_path(&self) -> &str {
        &self.inbox_path
    }

    /// Number of distinct keys, variants included.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
