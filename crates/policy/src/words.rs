// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Light word splitting for policy checks.
//!
//! This is not a shell parser. It splits text into commands on the
//! separators a shell would honor (`;`, `&&`, `||`, `|`, `&`, newline)
//! and words on unquoted whitespace, keeping quoted payloads intact so
//! rules can re-scan `sh -c '...'` bodies. Expansion is not performed.

/// Split text into words, honoring single and double quotes.
pub fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                } else {
                    current.push(ch);
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                }
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        words.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}

/// Split text into per-command word lists.
///
/// Command boundaries are `;`, `&&`, `||`, `|`, a trailing `&`, and
/// newlines, outside quotes. Each command is then word-split.
pub fn split_commands(text: &str) -> Vec<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        match quote {
            Some(q) => {
                current.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    current.push(ch);
                }
                ';' | '\n' => {
                    segments.push(std::mem::take(&mut current));
                }
                '&' | '|' => {
                    // Collapse && and || into a single boundary
                    if chars.peek() == Some(&ch) {
                        chars.next();
                    }
                    segments.push(std::mem::take(&mut current));
                }
                c => current.push(c),
            },
        }
    }
    segments.push(current);

    segments
        .iter()
        .map(|s| split_words(s))
        .filter(|words| !words.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "words_tests.rs"]
mod tests;
