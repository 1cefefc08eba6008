//! Key normalization
//!
//! Maps caller-supplied identifiers to keys safe for filesystem paths and
//! wire protocols. Normalization is a pure function of the raw key and is
//! applied exactly once per operation. The prefix must never double-apply,
//! so callers hold raw keys and normalize at the backend boundary.

use crate::constants::KEY_SEPARATOR;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Normalize a raw key and prepend the engine prefix.
///
/// Transform order: path-separator-like characters (`/`, `.`, `\`) become
/// the separator, then the result is trimmed, lowercased, and whitespace
/// runs collapse to a single separator. Empty input, or input that reduces
/// to nothing, is rejected.
pub fn normalize(raw: &str, prefix: &str) -> Result<String> {
    if raw.is_empty() {
        return Err(Error::invalid_key("key must not be empty"));
    }

    let mut replaced = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '/' | '.' | '\\') {
            replaced.push(KEY_SEPARATOR);
        } else {
            replaced.push(c);
        }
    }

    let lowered = replaced.trim().to_lowercase();
    let separator = KEY_SEPARATOR.to_string();
    let collapsed = WHITESPACE_RUN.replace_all(&lowered, separator.as_str());

    if collapsed.is_empty() {
        return Err(Error::invalid_key(format!(
            "key {raw:?} reduced to nothing after normalization"
        )));
    }

    Ok(format!("{prefix}{collapsed}"))
}
