//! `@handle` extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

const MENTION_PATTERN: &str = r"@(\w+)";

static MENTION: Lazy<Option<Regex>> = Lazy::new(|| match Regex::new(MENTION_PATTERN) {
    Ok(pattern) => Some(pattern),
    Err(err) => {
        error!(error = %err, "mention pattern failed to compile, mentions are disabled");
        None
    }
});

/// Handles mentioned in `text`, in order of first appearance, without duplicates.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut handles: Vec<String> = Vec::new();
    let Some(pattern) = MENTION.as_ref() else {
        return handles;
    };
    for captures in pattern.captures_iter(text) {
        let handle = &captures[1];
        if !handles.iter().any(|seen| seen == handle) {
            handles.push(handle.to_string());
        }
    }
    handles
}
