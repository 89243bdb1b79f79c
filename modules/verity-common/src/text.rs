//! Text normalization shared by validation, query building and cache keys.

use std::sync::OnceLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::VerificationError;

pub const MIN_TEXT_CHARS: usize = 10;
pub const MAX_TEXT_CHARS: usize = 10_000;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

fn disallowed_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s.,!?-]").expect("valid regex"))
}

/// Collapse whitespace, drop everything but word characters and basic
/// punctuation, and trim.
pub fn clean_text(text: &str) -> String {
    let collapsed = whitespace_re().replace_all(text, " ");
    disallowed_chars_re()
        .replace_all(&collapsed, "")
        .trim()
        .to_string()
}

/// Reject empty, too-short, or oversized claims before any collaborator call.
pub fn validate_text(text: &str) -> Result<(), VerificationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(VerificationError::InvalidInput(
            "Text must be a non-empty string".to_string(),
        ));
    }
    let chars = trimmed.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(VerificationError::InvalidInput(format!(
            "Text must be at least {MIN_TEXT_CHARS} characters long"
        )));
    }
    if chars > MAX_TEXT_CHARS {
        return Err(VerificationError::InvalidInput(format!(
            "Text must not exceed {MAX_TEXT_CHARS} characters"
        )));
    }
    Ok(())
}

/// Trim, case-fold and collapse whitespace so incidental formatting
/// differences map to the same cache entry.
pub fn normalize_for_key(text: &str) -> String {
    whitespace_re()
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Deterministic cache key: SHA-256 over the namespace and each normalized
/// part, length-prefixed so part boundaries can't collide.
pub fn cache_key(namespace: &str, parts: &[Option<&str>]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    for part in parts {
        match part {
            Some(p) => {
                let norm = normalize_for_key(p);
                hasher.update([1u8]);
                hasher.update((norm.len() as u64).to_le_bytes());
                hasher.update(norm.as_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
    format!("{namespace}:{}", hex::encode(hasher.finalize()))
}

/// Lower-case and turn hyphens into spaces for keyword scanning.
pub fn normalize_hyphens(text: &str) -> String {
    text.to_lowercase().replace('-', " ")
}

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}
