use std::sync::LazyLock;

use regex::Regex;

use crate::util::extract_fenced_block;

static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<!doctype\s+html").unwrap());

/// Pull the HTML document out of a model reply.
///
/// Preference order: an ```` ```html ```` fence, then everything from a
/// `<!DOCTYPE html` marker, then the reply verbatim. Never fails, so a
/// malformed reply still produces something visible downstream.
pub fn extract_document(raw: &str) -> String {
    if let Some(block) = extract_fenced_block(raw, "html") {
        return block;
    }
    if let Some(m) = DOCTYPE.find(raw) {
        let tail = raw[m.start()..].trim_end();
        return tail.strip_suffix("```").unwrap_or(tail).trim_end().to_string();
    }
    raw.to_string()
}
