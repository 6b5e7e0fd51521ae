//! Evidence selection: focused context snippets for prompts and bulleted
//! evidence digests for module rendering.
//!
//! Both rank sentences by focus-term hits so prompt budgets are spent on
//! the material a given module actually draws from.

use playforge_core::text::split_sentences;
use std::collections::HashSet;

/// Default snippet budget, in chars.
pub const DEFAULT_SNIPPET_CHARS: usize = 7_200;

/// Default digest budget.
pub const DEFAULT_DIGEST_BULLETS: usize = 24;
pub const DEFAULT_DIGEST_CHARS: usize = 9_000;

fn hit_count(sentence_lower: &str, terms: &[String]) -> usize {
    terms.iter().filter(|term| sentence_lower.contains(term.as_str())).count()
}

/// Pick the sentences most relevant to `focus_terms`, keeping source
/// order, up to `max_chars`. Falls back to a plain prefix when nothing
/// scores.
pub fn focused_snippet(text: &str, focus_terms: &[String], max_chars: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return playforge_core::text::clamp_chars(text.trim(), max_chars);
    }

    let mut scored: Vec<(usize, usize, &String)> = Vec::new();
    let mut seen = HashSet::new();
    for (index, sentence) in sentences.iter().enumerate() {
        let lower = sentence.to_lowercase();
        if !seen.insert(lower.clone()) {
            continue;
        }
        let hits = hit_count(&lower, focus_terms);
        if hits == 0 {
            continue;
        }
        let mut score = hits * 3;
        let chars = sentence.chars().count();
        if (40..=280).contains(&chars) {
            score += 1;
        }
        scored.push((score, index, sentence));
    }

    if scored.is_empty() {
        return playforge_core::text::clamp_chars(text.trim(), max_chars);
    }

    // Best first for selection, then back to source order for output.
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    let mut selected: Vec<(usize, &String)> = Vec::new();
    let mut used = 0usize;
    for (_, index, sentence) in scored {
        let chars = sentence.chars().count() + 1;
        if used + chars > max_chars {
            continue;
        }
        used += chars;
        selected.push((index, sentence));
    }
    selected.sort_by_key(|(index, _)| *index);
    selected.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>().join(" ")
}

/// Build a bulleted evidence digest for one module.
///
/// Sentences are scored by module-title and context-term hits, with a
/// bonus for concrete figures (digits) and substantial length.
pub fn evidence_digest(
    module_title: &str,
    context_text: &str,
    terms: &[String],
    max_bullets: usize,
    max_chars: usize,
) -> String {
    let title_lower = module_title.to_lowercase();
    let title_tokens: Vec<String> = title_lower
        .split(|c: char| !c.is_alphanumeric() && !('\u{4e00}'..='\u{9fff}').contains(&c))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect();

    let mut scored: Vec<(usize, usize, String)> = Vec::new();
    let mut seen = HashSet::new();
    for (index, sentence) in split_sentences(context_text).into_iter().enumerate() {
        let lower = sentence.to_lowercase();
        if !seen.insert(lower.clone()) {
            continue;
        }
        let base = hit_count(&lower, terms) + hit_count(&lower, &title_tokens) * 2;
        if base == 0 {
            continue;
        }
        let mut score = base;
        if lower.chars().any(|c| c.is_ascii_digit()) {
            score += 1;
        }
        let chars = sentence.chars().count();
        if (35..=260).contains(&chars) {
            score += 1;
        }
        scored.push((score, index, sentence));
    }

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut bullets = Vec::new();
    let mut used = 0usize;
    for (_, _, sentence) in scored {
        if bullets.len() >= max_bullets {
            break;
        }
        let line = format!("- {sentence}");
        let chars = line.chars().count() + 1;
        if used + chars > max_chars {
            continue;
        }
        used += chars;
        bullets.push(line);
    }
    bullets.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The grain levy was doubled in the spring of the third year. \
        Court fashion favored silk that season and little else mattered to the nobles. \
        Treasury officials reported the grain reserves had fallen to a two-month supply. \
        Treasury officials reported the grain reserves had fallen to a two-month supply. \
        A riot over bread prices closed the eastern market for nine days.";

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn snippet_prefers_focus_hits() {
        let snippet = focused_snippet(TEXT, &terms(&["grain", "treasury"]), 200);
        assert!(snippet.contains("grain levy"));
        assert!(!snippet.contains("silk"));
    }

    #[test]
    fn snippet_dedupes_repeated_sentences() {
        let snippet = focused_snippet(TEXT, &terms(&["treasury"]), 10_000);
        assert_eq!(snippet.matches("two-month supply").count(), 1);
    }

    #[test]
    fn snippet_falls_back_to_prefix() {
        let snippet = focused_snippet("short unscored text", &terms(&["nomatch"]), 10);
        assert_eq!(snippet, "short unsc");
    }

    #[test]
    fn digest_emits_bullets_with_figures_first() {
        let digest =
            evidence_digest("Grain Crisis", TEXT, &terms(&["grain", "treasury"]), 24, 9_000);
        assert!(digest.starts_with("- "));
        let first = digest.lines().next().unwrap();
        assert!(first.contains("grain"), "got {first}");
        assert!(!digest.contains("silk"));
    }

    #[test]
    fn digest_respects_bullet_cap() {
        let digest = evidence_digest("Grain Crisis", TEXT, &terms(&["grain"]), 1, 9_000);
        assert_eq!(digest.lines().count(), 1);
    }

    #[test]
    fn digest_is_empty_for_unrelated_context() {
        let digest = evidence_digest("Naval Doctrine", "的 是", &terms(&["flotilla"]), 24, 9_000);
        assert!(digest.is_empty());
    }
}
