// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Failures reported by the mail protocol gateway and the live channel.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Malformed(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for GatewayError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        GatewayError::Timeout(err.to_string())
    }
}
