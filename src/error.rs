// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::folders::ExpansionStoreError;
use crate::gateway::{FolderAction, GatewayError};

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Unknown account: {0}")]
    UnknownAccount(String),
    #[error("Account already registered: {0}")]
    AccountExists(String),
    #[error("Folder {action} failed for {path}: {source}")]
    ActionFailed {
        action: FolderAction,
        path: String,
        #[source]
        source: GatewayError,
    },
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Expansion state error: {0}")]
    Storage(#[from] ExpansionStoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = PanelError> = std::result::Result<T, E>;
