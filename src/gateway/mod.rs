// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Boundary to the external collaborators: the mail protocol gateway
// (listing, count snapshot, folder actions) and the live change channel.

pub mod error;
pub mod feed;
pub mod file;
pub mod types;

pub use error::GatewayError;
pub use feed::{ChangeFeed, FeedMessage, Subscription};
pub use file::JsonFileGateway;
pub use types::{CountChange, FolderAction, FolderActionRequest, LiveChannel, MailGateway, Topic};

#[cfg(test)]
pub use types::MockMailGateway;
