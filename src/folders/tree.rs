// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parent/child reconstruction from a flat folder listing.
//!
//! Linkage is derived purely from path containment. A folder whose parent
//! path is not itself in the listing becomes a root; the server-reported
//! level never overrides that.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};

use super::sort::SystemFolderPolicy;
use super::types::{AccountId, Folder};

/// Immutable folder hierarchy of one account.
///
/// Rebuilt wholesale from every listing; never patched node by node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderTree {
    pub account_id: AccountId,
    pub roots: Vec<Folder>,
    pub children_of: HashMap<String, Vec<Folder>>,
}

impl FolderTree {
    /// Builds the hierarchy for one account.
    ///
    /// The result does not depend on input order. Sibling lists come out in
    /// path order; call [`FolderTree::sort_with`] to apply a sibling policy.
    pub fn build(account_id: &str, folders: Vec<Folder>) -> Self {
        // Pass 1: the set of known paths. Literal duplicates collapse to a
        // single node chosen independently of arrival order.
        let mut by_path: BTreeMap<String, Folder> = BTreeMap::new();
        for folder in folders {
            if folder.account_id != account_id {
                warn!(
                    "Ignoring folder {} of account {} in listing for {}",
                    folder.path, folder.account_id, account_id
                );
                continue;
            }
            let replace = match by_path.get(&folder.path) {
                Some(existing) => {
                    warn!("Duplicate folder path {} in listing for {}", folder.path, account_id);
                    duplicate_rank(&folder) < duplicate_rank(existing)
                }
                None => true,
            };
            if replace {
                by_path.insert(folder.path.clone(), folder);
            }
        }
        let known: HashSet<&str> = by_path.keys().map(String::as_str).collect();

        // Pass 2: link each folder under its parent when that parent exists.
        let mut roots = Vec::new();
        let mut children_of: HashMap<String, Vec<Folder>> = HashMap::new();
        for folder in by_path.values() {
            match folder.parent_path() {
                Some(parent) if known.contains(parent) => {
                    children_of
                        .entry(parent.to_string())
                        .or_default()
                        .push(folder.clone());
                }
                Some(parent) => {
                    debug!("Folder {} has no listed parent {}, treating as root", folder.path, parent);
                    roots.push(folder.clone());
                }
                None => roots.push(folder.clone()),
            }
        }

        Self {
            account_id: account_id.to_string(),
            roots,
            children_of,
        }
    }

    /// Applies the sibling policy to the roots and to every child list
    /// independently.
    pub fn sort_with(&mut self, policy: &SystemFolderPolicy) {
        policy.sort_siblings(&mut self.roots);
        for siblings in self.children_of.values_mut() {
            policy.sort_siblings(siblings);
        }
    }

    pub fn children(&self, path: &str) -> &[Folder] {
        self.children_of.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, path: &str) -> bool {
        !self.children(path).is_empty()
    }

    pub fn len(&self) -> usize {
        self.roots.len() + self.children_of.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every folder in the tree, parents before children.
    pub fn folders(&self) -> Vec<&Folder> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<&Folder> = self.roots.iter().rev().collect();
        while let Some(folder) = stack.pop() {
            out.push(folder);
            stack.extend(self.children(&folder.path).iter().rev());
        }
        out
    }
}

fn duplicate_rank(folder: &Folder) -> (&str, &str, Option<char>) {
    (&folder.display_name, &folder.name, folder.delimiter)
}
