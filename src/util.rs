//! Shared text helpers for the showcase crate.

use std::path::Path;

/// Cut `text` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Read a file as lossy UTF-8 and keep its first `max_chars` characters.
/// Returns `None` for missing, unreadable or blank files.
pub fn read_excerpt(path: &Path, max_chars: usize) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    if text.trim().is_empty() {
        return None;
    }
    Some(truncate_chars(&text, max_chars).to_string())
}

/// Extract the body of the first fenced code block tagged `lang`.
/// The closing fence is optional so truncated replies still yield content.
pub fn extract_fenced_block(text: &str, lang: &str) -> Option<String> {
    let opener = format!("```{}", lang);
    let lower = text.to_ascii_lowercase();
    let start = lower.find(&opener.to_ascii_lowercase())?;
    let after_tag = &text[start + opener.len()..];
    let body_start = after_tag.find('\n').map(|i| i + 1).unwrap_or(after_tag.len());
    let body = &after_tag[body_start..];
    let body = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}
