// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::expansion::ExpansionState;
use super::tree::FolderTree;
use super::types::{FlatFolder, Folder};

/// Projects a sorted tree into its render sequence.
///
/// Depth-first; a node's children are visited only when its key is in the
/// expansion set. Iterative so deep hierarchies cannot exhaust the stack.
pub fn flatten(tree: &FolderTree, expansion: &ExpansionState) -> Vec<FlatFolder> {
    let mut out = Vec::new();
    let mut stack: Vec<(&Folder, usize)> = tree.roots.iter().rev().map(|f| (f, 0)).collect();

    while let Some((folder, level)) = stack.pop() {
        let children = tree.children(&folder.path);
        let expanded = expansion.is_expanded(&folder.account_id, &folder.path);
        if expanded {
            stack.extend(children.iter().rev().map(|child| (child, level + 1)));
        }
        out.push(FlatFolder {
            folder: folder.clone(),
            level,
            has_children: !children.is_empty(),
            expanded,
        });
    }
    out
}
