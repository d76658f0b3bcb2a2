// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::RwLock;

use super::types::FolderKey;

/// JSON key the expanded folder set is stored under.
pub const EXPANSION_STORAGE_KEY: &str = "expanded_folders";

#[derive(Error, Debug)]
pub enum ExpansionStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Set of expanded folders across all accounts. Absent means collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<FolderKey>,
}

impl ExpansionState {
    pub fn is_expanded(&self, account_id: &str, path: &str) -> bool {
        self.expanded.contains(&FolderKey::new(account_id, path))
    }

    /// Returns true when the set changed.
    pub fn set_expanded(&mut self, account_id: &str, path: &str, expanded: bool) -> bool {
        let key = FolderKey::new(account_id, path);
        if expanded {
            self.expanded.insert(key)
        } else {
            self.expanded.remove(&key)
        }
    }

    /// Flips a folder and returns its new state.
    pub fn toggle(&mut self, account_id: &str, path: &str) -> bool {
        let key = FolderKey::new(account_id, path);
        if self.expanded.remove(&key) {
            false
        } else {
            self.expanded.insert(key);
            true
        }
    }

    /// Drops every key of an account; returns how many were removed.
    pub fn forget_account(&mut self, account_id: &str) -> usize {
        let before = self.expanded.len();
        self.expanded.retain(|k| k.account_id != account_id);
        before - self.expanded.len()
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// On-disk layout of the expansion state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ExpansionStorage {
    #[serde(default)]
    expanded_folders: BTreeSet<FolderKey>,
}

impl From<&ExpansionState> for ExpansionStorage {
    fn from(state: &ExpansionState) -> Self {
        Self {
            expanded_folders: state.expanded.iter().cloned().collect(),
        }
    }
}

impl From<ExpansionStorage> for ExpansionState {
    fn from(storage: ExpansionStorage) -> Self {
        Self {
            expanded: storage.expanded_folders.into_iter().collect(),
        }
    }
}

/// File-backed expansion state: loaded once, rewritten on every change.
pub struct ExpansionStore {
    storage_path: PathBuf,
    state: RwLock<ExpansionState>,
}

impl ExpansionStore {
    pub fn new(storage_path: impl AsRef<Path>) -> Self {
        Self {
            storage_path: storage_path.as_ref().to_path_buf(),
            state: RwLock::new(ExpansionState::default()),
        }
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Loads the persisted state, creating an empty file when missing.
    pub async fn initialize(&self) -> Result<(), ExpansionStoreError> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::read_to_string(&self.storage_path).await {
            Ok(contents) => {
                let storage: ExpansionStorage = serde_json::from_str(&contents)?;
                let state = ExpansionState::from(storage);
                info!(
                    "Loaded {} expanded folders from {}",
                    state.len(),
                    self.storage_path.display()
                );
                *self.state.write().await = state;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Expansion state file not found, creating new: {}", self.storage_path.display());
                self.save(&*self.state.read().await).await?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    async fn save(&self, state: &ExpansionState) -> Result<(), ExpansionStoreError> {
        let json = serde_json::to_string_pretty(&ExpansionStorage::from(state))?;
        fs::write(&self.storage_path, json).await?;
        debug!("Saved expansion state to {}", self.storage_path.display());
        Ok(())
    }

    /// Point-in-time copy for rendering.
    pub async fn snapshot(&self) -> ExpansionState {
        self.state.read().await.clone()
    }

    pub async fn is_expanded(&self, account_id: &str, path: &str) -> bool {
        self.state.read().await.is_expanded(account_id, path)
    }

    /// Toggles a folder and persists before returning. Returns the new state.
    pub async fn toggle(&self, account_id: &str, path: &str) -> Result<bool, ExpansionStoreError> {
        let mut state = self.state.write().await;
        let expanded = state.toggle(account_id, path);
        self.save(&state).await?;
        Ok(expanded)
    }

    pub async fn set_expanded(
        &self,
        account_id: &str,
        path: &str,
        expanded: bool,
    ) -> Result<(), ExpansionStoreError> {
        let mut state = self.state.write().await;
        if state.set_expanded(account_id, path, expanded) {
            self.save(&state).await?;
        }
        Ok(())
    }

    /// Applies many changes of one account with a single write.
    pub async fn set_many<'a, I>(
        &self,
        account_id: &str,
        paths: I,
        expanded: bool,
    ) -> Result<(), ExpansionStoreError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut state = self.state.write().await;
        let mut changed = false;
        for path in paths {
            changed |= state.set_expanded(account_id, path, expanded);
        }
        if changed {
            self.save(&state).await?;
        }
        Ok(())
    }

    pub async fn forget_account(&self, account_id: &str) -> Result<(), ExpansionStoreError> {
        let mut state = self.state.write().await;
        if state.forget_account(account_id) > 0 {
            self.save(&state).await?;
        }
        Ok(())
    }
}
