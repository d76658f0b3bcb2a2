// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use super::account::AccountPanel;
use crate::error::{PanelError, Result};
use crate::gateway::{FolderAction, FolderActionRequest, GatewayError, MailGateway};

/// Sends folder actions to the gateway and invalidates the account's
/// listing and counts once the gateway confirms.
///
/// System folders are not guarded here; callers decide which actions to offer.
pub struct FolderActionDispatcher {
    gateway: Arc<dyn MailGateway>,
    request_timeout: Duration,
}

impl FolderActionDispatcher {
    pub fn new(gateway: Arc<dyn MailGateway>, request_timeout: Duration) -> Self {
        Self {
            gateway,
            request_timeout,
        }
    }

    pub async fn mark_all_read(&self, panel: &AccountPanel, path: &str) -> Result<()> {
        self.dispatch(panel, FolderAction::MarkAllRead, path).await
    }

    pub async fn empty(&self, panel: &AccountPanel, path: &str) -> Result<()> {
        self.dispatch(panel, FolderAction::Empty, path).await
    }

    pub async fn delete(&self, panel: &AccountPanel, path: &str) -> Result<()> {
        self.dispatch(panel, FolderAction::Delete, path).await
    }

    /// One request per call. On failure the panel state is left as it was.
    pub async fn dispatch(&self, panel: &AccountPanel, action: FolderAction, path: &str) -> Result<()> {
        let request = FolderActionRequest {
            action,
            folder_path: path.to_string(),
            account_id: panel.account_id().to_string(),
        };

        let outcome = tokio::time::timeout(self.request_timeout, self.gateway.perform(request))
            .await
            .unwrap_or_else(|elapsed| Err(GatewayError::from(elapsed)));

        if let Err(source) = outcome {
            error!("Folder {} on {} for {} failed: {}", action, path, panel.account_id(), source);
            return Err(PanelError::ActionFailed {
                action,
                path: path.to_string(),
                source,
            });
        }

        info!("Folder {} on {} for {} succeeded", action, path, panel.account_id());
        panel.invalidate().await;
        Ok(())
    }
}
