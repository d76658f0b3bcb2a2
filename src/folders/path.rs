// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Folder path canonicalization.
//!
//! Providers disagree on how a folder path is spelled: `INBOX.Work`,
//! `inbox/work` and `INBOX\Work` all name the same mailbox. The helpers here
//! turn any of those into one comparable key and derive parent linkage from
//! a raw path.

/// Separator assumed when a path has no delimiter hint and contains no `/`.
pub const FALLBACK_SEPARATOR: char = '.';

/// Canonical separator used by [`normalize`].
pub const CANONICAL_SEPARATOR: char = '/';

/// Canonicalizes a folder path into a comparable key.
///
/// Uppercases, trims, maps `.` and `\` to `/` and collapses runs of `/`.
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(path: &str) -> String {
    let upper = path.trim().to_uppercase();
    let mut out = String::with_capacity(upper.len());
    let mut last_was_separator = false;

    for ch in upper.chars() {
        let ch = match ch {
            '.' | '\\' => CANONICAL_SEPARATOR,
            other => other,
        };
        if ch == CANONICAL_SEPARATOR {
            if last_was_separator {
                continue;
            }
            last_was_separator = true;
        } else {
            last_was_separator = false;
        }
        out.push(ch);
    }
    out
}

/// Picks the separator for a raw path.
///
/// The provider hint wins; otherwise `/` when the path contains one, else `.`.
pub fn separator_for(path: &str, delimiter: Option<char>) -> char {
    match delimiter {
        Some(delim) => delim,
        None if path.contains('/') => '/',
        None => FALLBACK_SEPARATOR,
    }
}

/// Returns the substring before the last separator occurrence, if any.
pub fn parent_path(path: &str, separator: char) -> Option<&str> {
    path.rfind(separator).map(|idx| &path[..idx])
}

/// Last path segment, used when a listing omits a display name.
pub fn leaf_name(path: &str, separator: char) -> &str {
    match path.rfind(separator) {
        Some(idx) => &path[idx + separator.len_utf8()..],
        None => path,
    }
}
