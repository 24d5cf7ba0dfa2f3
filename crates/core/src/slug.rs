// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slugify strings for multiplexer session name segments.

/// Maximum length of one session-name segment.
pub const SEGMENT_MAX: usize = 36;

/// Slugify one segment of a multiplexer session name.
///
/// Keeps lower-cased ASCII alphanumerics only, truncates to `max_len`,
/// and substitutes `"x"` when nothing survives. Multiplexers are picky
/// about separators inside targets, so segments carry no punctuation at
/// all; the caller joins segments with hyphens.
pub fn slug_segment(input: &str, max_len: usize) -> String {
    let mut slug: String = input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if slug.len() > max_len {
        slug.truncate(max_len);
    }

    if slug.is_empty() {
        "x".to_string()
    } else {
        slug
    }
}

/// Build the multiplexer session name for an agent session.
///
/// Format: `slug(project)-slug(task)-slug(role)`.
pub fn session_name(project: &str, task: &str, role: &str) -> String {
    format!(
        "{}-{}-{}",
        slug_segment(project, SEGMENT_MAX),
        slug_segment(task, SEGMENT_MAX),
        slug_segment(role, SEGMENT_MAX)
    )
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
