// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Sibling ordering with system folders first.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::path::normalize;
use super::types::Folder;

/// One recognized system folder and the tokens that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemFolder {
    pub kind: String,
    pub aliases: Vec<String>,
}

impl SystemFolder {
    pub fn new(kind: &str, aliases: &[&str]) -> Self {
        Self {
            kind: kind.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Ordered list of system folder tokens defining sibling priority.
#[derive(Debug, Clone)]
pub struct SystemFolderPolicy {
    /// (priority index, normalized token) in declaration order.
    tokens: Vec<(usize, String)>,
}

impl SystemFolderPolicy {
    pub fn new(folders: &[SystemFolder]) -> Self {
        let mut tokens = Vec::new();
        for (idx, folder) in folders.iter().enumerate() {
            tokens.push((idx, normalize(&folder.kind)));
            for alias in &folder.aliases {
                tokens.push((idx, normalize(alias)));
            }
        }
        tokens.retain(|(_, token)| !token.is_empty());
        Self { tokens }
    }

    pub fn default_folders() -> Vec<SystemFolder> {
        vec![
            SystemFolder::new("INBOX", &["POSTEINGANG", "BOITE DE RECEPTION", "BANDEJA DE ENTRADA"]),
            SystemFolder::new("SENT", &["GESENDET", "ENVOYES", "ENVIADOS"]),
            SystemFolder::new("DRAFT", &["ENTWÜRFE", "ENTWURF", "BROUILLONS", "BORRADORES"]),
            SystemFolder::new("TRASH", &["DELETED", "PAPIERKORB", "CORBEILLE", "PAPELERA"]),
            SystemFolder::new("SPAM", &["JUNK", "BULK"]),
        ]
    }

    fn match_token(&self, value: &str) -> Option<usize> {
        let key = normalize(value);
        if key.is_empty() {
            return None;
        }
        self.tokens
            .iter()
            .find(|(_, token)| key.contains(token.as_str()))
            .map(|(idx, _)| *idx)
    }

    /// Priority of a folder: its `name` is tried first, then `display_name`.
    pub fn priority(&self, folder: &Folder) -> Option<usize> {
        self.match_token(&folder.name)
            .or_else(|| self.match_token(&folder.display_name))
    }

    pub fn compare(&self, a: &Folder, b: &Folder) -> Ordering {
        self.sort_key(a).cmp(&self.sort_key(b))
    }

    /// Sorts one sibling list in place.
    pub fn sort_siblings(&self, siblings: &mut [Folder]) {
        siblings.sort_by_cached_key(|f| self.sort_key(f));
    }

    /// Resolved folders first (by token index), then the display name with
    /// case and accents folded, then case-folded only, with raw name and path
    /// as deterministic tie-breaks.
    fn sort_key(&self, folder: &Folder) -> (bool, usize, String, String, String, String) {
        let priority = self.priority(folder);
        (
            priority.is_none(),
            priority.unwrap_or(0),
            collation_key(&folder.display_name),
            folder.display_name.to_lowercase(),
            folder.display_name.clone(),
            folder.path.clone(),
        )
    }
}

/// Primary alphabetic key: canonical decomposition with combining marks
/// stripped, lowercased. `Écoles` sorts with `ecoles`, not after `z`.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

impl Default for SystemFolderPolicy {
    fn default() -> Self {
        Self::new(&Self::default_folders())
    }
}
