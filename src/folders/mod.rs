// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Folder hierarchy: path canonicalization, tree reconstruction, sibling
// ordering, expansion state and the flattened render projection.

pub mod expansion;
pub mod flatten;
pub mod path;
pub mod sort;
pub mod tree;
pub mod types;

pub use expansion::{ExpansionState, ExpansionStore, ExpansionStoreError};
pub use flatten::flatten;
pub use path::normalize;
pub use sort::{SystemFolder, SystemFolderPolicy};
pub use tree::FolderTree;
pub use types::{AccountId, FlatFolder, Folder, FolderKey, FolderListing};
