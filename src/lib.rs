// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Library core for MailPanel: folder hierarchy and live unread counts for
//! multi-account mail clients.

// --- Modules ---
pub mod config;
pub mod counts;
pub mod error;
pub mod folders;
pub mod gateway;
pub mod panel;

pub mod prelude {
    // Config
    pub use crate::config::Settings;
    pub use crate::error::{PanelError, Result};

    // Folder hierarchy
    pub use crate::folders::{
        flatten, ExpansionState, ExpansionStore, FlatFolder, Folder, FolderKey, FolderListing,
        FolderTree, SystemFolderPolicy,
    };

    // Counts
    pub use crate::counts::{AccountCounts, CountMap, CountSnapshot};

    // Gateway
    pub use crate::gateway::{
        ChangeFeed, CountChange, FolderAction, GatewayError, JsonFileGateway, LiveChannel,
        MailGateway, Topic,
    };

    // Panel
    pub use crate::panel::{AccountPanel, FolderPanel, FolderRow, ListingState, PanelView};

    // Common Libs
    pub use log::{debug, error, info, trace, warn};
    pub use std::sync::Arc;
}
