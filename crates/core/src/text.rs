//! Text utilities shared across the pipeline.
//!
//! All truncation is by character count, never by byte, so multi-byte
//! content (CJK source material is common) is never split mid-scalar.

/// Ceiling for a single ingested document's content, in chars.
pub const MAX_SOURCE_CONTENT: usize = 120_000;

/// Ceiling for the aggregated context text, in chars.
pub const MAX_CONTEXT_TEXT: usize = 180_000;

/// Ceiling for a source snippet, in chars.
pub const MAX_SNIPPET: usize = 1_200;

/// Truncate a string to at most `max_chars` characters.
pub fn clamp_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect()
}

/// Trim a value, substituting a fallback when empty.
pub fn text_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

/// Lowercase slug of a title: ASCII alphanumerics, runs of everything else
/// collapsed into single hyphens, capped at 60 chars.
pub fn slugify(value: &str) -> String {
    let mut out = String::new();
    let mut pending_hyphen = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if out.len() >= 60 {
            break;
        }
    }
    out.trim_matches('-').to_string()
}

/// Strip tags and entities from an HTML document, collapsing whitespace.
///
/// Script and style bodies are dropped entirely.
pub fn strip_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() / 2);
    // ASCII lowering keeps byte offsets aligned with `raw`.
    let lower = raw.to_ascii_lowercase();
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            // Skip script/style blocks wholesale.
            if lower[i..].starts_with("<script") {
                match lower[i..].find("</script") {
                    Some(end) => {
                        i += end;
                        i += lower[i..].find('>').map(|p| p + 1).unwrap_or(lower.len() - i);
                        out.push(' ');
                        continue;
                    }
                    None => break,
                }
            }
            if lower[i..].starts_with("<style") {
                match lower[i..].find("</style") {
                    Some(end) => {
                        i += end;
                        i += lower[i..].find('>').map(|p| p + 1).unwrap_or(lower.len() - i);
                        out.push(' ');
                        continue;
                    }
                    None => break,
                }
            }
            match raw[i..].find('>') {
                Some(end) => {
                    i += end + 1;
                    out.push(' ');
                    continue;
                }
                None => break,
            }
        }
        // Advance one full character, not one byte.
        let ch = raw[i..].chars().next().unwrap_or(' ');
        out.push(ch);
        i += ch.len_utf8();
    }
    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    collapse_whitespace(&decoded)
}

/// Collapse all whitespace runs into single spaces and trim.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape a value for safe embedding in HTML text or attributes.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Split text into sentences on Latin and CJK terminators, keeping only
/// fragments of at least 8 chars.
pub fn split_sentences(text: &str) -> Vec<String> {
    collapse_whitespace(text)
        .split(['。', '！', '？', '.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() >= 8)
        .map(str::to_string)
        .collect()
}

/// Extract the first balanced JSON object from generative output.
///
/// Tries the raw text first, then the substring between the first `{` and
/// the last `}` — models often wrap JSON in prose or fences.
pub fn extract_json_block(text: &str) -> Option<serde_json::Value> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
        if value.is_object() {
            return Some(value);
        }
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Extract an HTML document from generative output.
///
/// Accepts a fenced ```html block or a bare document containing a doctype,
/// `<html>`, or `<body>` marker. Returns `None` for anything else.
pub fn extract_html_block(text: &str) -> Option<String> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(start) = raw.find("```") {
        let after = &raw[start + 3..];
        let after = after.strip_prefix("html").unwrap_or(after);
        let after = after.trim_start_matches(['\r', '\n']);
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if !inner.is_empty() {
                return Some(inner.to_string());
            }
        }
    }
    let lower = raw.to_lowercase();
    if lower.contains("<!doctype html") || lower.contains("<html") || lower.contains("<body") {
        return Some(raw.to_string());
    }
    None
}
