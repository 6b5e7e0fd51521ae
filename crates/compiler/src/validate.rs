//! Acceptance heuristics for rendered module HTML.
//!
//! Bridge and generative candidates must look like a real interactive
//! experience, not the built-in template re-emitted by the model and not
//! a husk with empty chips. Rejected candidates trigger the next tier.

use playforge_core::error::RenderError;

/// At least four of eight richness signals.
pub fn has_rich_interaction_signals(html: &str) -> bool {
    let text = html.to_lowercase();
    let signals = [
        contains_tag(&text, "canvas"),
        contains_tag(&text, "svg"),
        text.contains("type=\"range\"") || text.contains("type='range'"),
        text.contains("draggable=") || text.contains("dragstart"),
        contains_listener(&text, "input"),
        contains_listener(&text, "click"),
        class_contains_any(&text, &["timeline", "scenario", "mission", "board", "map"]),
        text.contains("requestanimationframe"),
    ];
    signals.iter().filter(|s| **s).count() >= 4
}

/// Any interactive element at all. The bridge tier accepts this as a
/// floor when the richness score falls short.
pub fn has_basic_interaction_signals(html: &str) -> bool {
    let text = html.to_lowercase();
    contains_tag(&text, "button")
        || contains_tag(&text, "input")
        || contains_tag(&text, "select")
        || contains_tag(&text, "details")
        || text.contains("onclick=")
        || text.contains("addeventlistener(")
}

/// At least three of nine signals that the candidate is the rigid
/// two-option layout the prompt explicitly forbids.
pub fn looks_like_rigid_binary_template(html: &str) -> bool {
    let text = html.to_lowercase();
    let signals = [
        text.contains("id=\"opt-a\"") || text.contains("id='opt-a'"),
        text.contains("id=\"opt-b\"") || text.contains("id='opt-b'"),
        class_contains_any(&text, &["options"]),
        ["option a", "option b", "plan a", "plan b"].iter().any(|s| text.contains(s)),
        text.contains("expected impact") || text.contains("consequence brief"),
        contains_round_number(&text),
        ["system stability", "resource vitality", "structural progress"]
            .iter()
            .any(|s| text.contains(s)),
        text.contains("intel cards") || text.contains("event log"),
        text.contains("main mission") && text.contains("knowledge anchor"),
    ];
    signals.iter().filter(|s| **s).count() >= 3
}

/// Empty spans next to buttons, or literal placeholder text in content
/// position.
pub fn has_obvious_empty_ui_slots(html: &str) -> bool {
    if html.is_empty() {
        return true;
    }
    let lower = html.to_lowercase();
    if has_empty_span(&lower) && contains_tag(&lower, "button") {
        return true;
    }
    for token in ["tbd", "todo", "n/a", "placeholder"] {
        if has_bare_text_node(&lower, token) {
            return true;
        }
    }
    false
}

/// Run the full gate for one candidate, naming the tier in the error.
pub fn validate_candidate(html: &str, tier: &str, allow_basic: bool) -> Result<(), RenderError> {
    let reject = |reason: &str| RenderError::CandidateRejected {
        tier: tier.to_string(),
        reason: reason.to_string(),
    };

    let lower = html.to_lowercase();
    if !contains_tag(&lower, "body") || !contains_tag(&lower, "script") {
        return Err(reject("not a complete html document"));
    }
    let rich = has_rich_interaction_signals(html);
    if !rich && !(allow_basic && has_basic_interaction_signals(html)) {
        return Err(reject("lacks interaction richness"));
    }
    if looks_like_rigid_binary_template(html) {
        return Err(reject("rigid binary template"));
    }
    if has_obvious_empty_ui_slots(html) {
        return Err(reject("placeholder or empty UI slots"));
    }
    Ok(())
}

fn contains_tag(lower: &str, tag: &str) -> bool {
    let open = format!("<{tag}");
    let mut search = lower;
    while let Some(pos) = search.find(&open) {
        let rest = &search[pos + open.len()..];
        match rest.as_bytes().first() {
            Some(b'>') | Some(b' ') | Some(b'\n') | Some(b'\t') | Some(b'/') => return true,
            _ => search = rest,
        }
    }
    false
}

fn contains_listener(lower: &str, event: &str) -> bool {
    lower.contains(&format!("addeventlistener(\"{event}\""))
        || lower.contains(&format!("addeventlistener('{event}'"))
}

fn class_contains_any(lower: &str, keywords: &[&str]) -> bool {
    for opener in ["class=\"", "class='"] {
        let quote = opener.as_bytes()[opener.len() - 1] as char;
        let mut search = lower;
        while let Some(pos) = search.find(opener) {
            let rest = &search[pos + opener.len()..];
            let value = rest.split(quote).next().unwrap_or("");
            if keywords.iter().any(|k| value.contains(k)) {
                return true;
            }
            search = rest;
        }
    }
    false
}

fn contains_round_number(lower: &str) -> bool {
    let mut search = lower;
    while let Some(pos) = search.find("round ") {
        let rest = &search[pos + 6..];
        if rest.as_bytes().first().is_some_and(|b| b.is_ascii_digit()) {
            return true;
        }
        search = rest;
    }
    false
}

fn has_empty_span(lower: &str) -> bool {
    let mut search = lower;
    while let Some(pos) = search.find("<span") {
        let rest = &search[pos + 5..];
        let Some(close) = rest.find('>') else { return false };
        let after = &rest[close + 1..];
        let Some(end) = after.find("</span>") else { return false };
        let inner = after[..end].trim();
        if inner.is_empty() || inner.chars().all(|c| matches!(c, '-' | '–' | '—')) {
            return true;
        }
        search = after;
    }
    false
}

fn has_bare_text_node(lower: &str, token: &str) -> bool {
    let mut search = lower;
    while let Some(pos) = search.find(token) {
        let before = search[..pos].trim_end();
        let after = search[pos + token.len()..].trim_start();
        if before.ends_with('>') && after.starts_with('<') {
            return true;
        }
        search = &search[pos + token.len()..];
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const RICH: &str = r#"<html><body class="mission-board">
        <svg viewBox="0 0 10 10"></svg>
        <input type="range" min="0" max="100">
        <div class="timeline"></div>
        <script>
        el.addEventListener("input", sync);
        el.addEventListener("click", apply);
        requestAnimationFrame(tick);
        </script></body></html>"#;

    #[test]
    fn rich_document_passes() {
        assert!(has_rich_interaction_signals(RICH));
        assert!(validate_candidate(RICH, "generative", false).is_ok());
    }

    #[test]
    fn static_page_is_not_rich() {
        let html = "<html><body><p>text</p><script></script></body></html>";
        assert!(!has_rich_interaction_signals(html));
        assert!(has_basic_interaction_signals("<button>go</button>"));
        assert!(!has_basic_interaction_signals(html));
    }

    #[test]
    fn rigid_template_is_detected() {
        let html = r#"<body><button id="opt-a"></button><button id="opt-b"></button>
            <h3>Round 1</h3><span>System Stability</span><script>x</script></body>"#;
        assert!(looks_like_rigid_binary_template(html));
        let err = validate_candidate(html, "bridge", true).unwrap_err();
        assert!(err.to_string().contains("bridge"));
    }

    #[test]
    fn empty_spans_near_buttons_are_rejected() {
        let html = "<body><button>act</button><span> - </span><script>x</script></body>";
        assert!(has_obvious_empty_ui_slots(html));

        let filled = "<body><button>act</button><span>42 pts</span><script>x</script></body>";
        assert!(!has_obvious_empty_ui_slots(filled));
    }

    #[test]
    fn placeholder_text_nodes_are_rejected() {
        assert!(has_obvious_empty_ui_slots("<body><div>TBD</div><script>x</script></body>"));
        assert!(!has_obvious_empty_ui_slots(
            "<body><div>The levy todo-list metaphor is explained here.</div><script>x</script></body>"
        ));
    }

    #[test]
    fn incomplete_documents_are_rejected() {
        let err = validate_candidate("<div>fragment</div>", "generative", false).unwrap_err();
        assert!(err.to_string().contains("complete html"));
    }
}
