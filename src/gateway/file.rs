// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Directory-backed gateway.
//!
//! Layout, one directory per account:
//!
//! ```text
//! <root>/<account_id>/folders.json   [{"path": "...", "delimiter": ".", ...}]
//! <root>/<account_id>/counts.json    {"INBOX": 3, "INBOX.Work": 1}
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tokio::fs;
use tokio::sync::Mutex;

use super::error::GatewayError;
use super::types::{FolderAction, FolderActionRequest, MailGateway};
use crate::counts::CountSnapshot;
use crate::folders::path::separator_for;
use crate::folders::FolderListing;

pub const FOLDERS_FILE: &str = "folders.json";
pub const COUNTS_FILE: &str = "counts.json";

pub struct JsonFileGateway {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileGateway {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn account_dir(&self, account_id: &str) -> Result<PathBuf, GatewayError> {
        if account_id.is_empty()
            || account_id.contains(['/', '\\'])
            || account_id == "."
            || account_id == ".."
        {
            return Err(GatewayError::AccountNotFound(account_id.to_string()));
        }
        let dir = self.root.join(account_id);
        if !dir.is_dir() {
            return Err(GatewayError::AccountNotFound(account_id.to_string()));
        }
        Ok(dir)
    }

    /// Lists account directories under the root.
    pub async fn account_ids(&self) -> Result<Vec<String>, GatewayError> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Seeds an account directory. Used by tests and first-run setup.
    pub async fn write_account(
        &self,
        account_id: &str,
        folders: &[FolderListing],
        counts: &CountSnapshot,
    ) -> Result<(), GatewayError> {
        let dir = self.root.join(account_id);
        fs::create_dir_all(&dir).await?;
        write_json(&dir.join(FOLDERS_FILE), folders).await?;
        write_json(&dir.join(COUNTS_FILE), counts).await?;
        Ok(())
    }

    async fn read_folders(&self, dir: &Path) -> Result<Vec<FolderListing>, GatewayError> {
        let contents = fs::read_to_string(dir.join(FOLDERS_FILE)).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn read_counts(&self, dir: &Path) -> Result<CountSnapshot, GatewayError> {
        match fs::read_to_string(dir.join(COUNTS_FILE)).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CountSnapshot::new()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), GatewayError> {
    let json = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json.as_bytes()).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

/// True when `path` is `target` or lies below it.
fn is_within(path: &str, target: &FolderListing) -> bool {
    if path == target.path {
        return true;
    }
    let delimiter = target.delimiter.as_deref().and_then(|d| d.chars().next());
    let separator = separator_for(&target.path, delimiter);
    path.strip_prefix(target.path.as_str())
        .is_some_and(|rest| rest.starts_with(separator))
}

#[async_trait]
impl MailGateway for JsonFileGateway {
    async fn list_folders(&self, account_id: &str) -> Result<Vec<FolderListing>, GatewayError> {
        let dir = self.account_dir(account_id)?;
        let folders = self.read_folders(&dir).await?;
        debug!("Listed {} folders for {}", folders.len(), account_id);
        Ok(folders)
    }

    async fn fetch_counts(&self, account_id: &str) -> Result<CountSnapshot, GatewayError> {
        let dir = self.account_dir(account_id)?;
        self.read_counts(&dir).await
    }

    async fn perform(&self, request: FolderActionRequest) -> Result<(), GatewayError> {
        let _guard = self.write_lock.lock().await;
        let dir = self.account_dir(&request.account_id)?;
        let mut folders = self.read_folders(&dir).await?;
        let mut counts = self.read_counts(&dir).await?;

        let target = folders
            .iter()
            .find(|f| f.path == request.folder_path)
            .cloned()
            .ok_or_else(|| GatewayError::FolderNotFound(request.folder_path.clone()))?;

        match request.action {
            FolderAction::MarkAllRead | FolderAction::Empty => {
                counts.insert(target.path.clone(), 0);
            }
            FolderAction::Delete => {
                folders.retain(|f| !is_within(&f.path, &target));
                counts.retain(|path, _| !is_within(path, &target));
                write_json(&dir.join(FOLDERS_FILE), &folders).await?;
            }
        }
        write_json(&dir.join(COUNTS_FILE), &counts).await?;

        info!(
            "Performed {} on {} for {}",
            request.action, request.folder_path, request.account_id
        );
        Ok(())
    }
}
