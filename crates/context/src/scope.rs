//! Scope estimation: how many playable modules a context deserves.

use playforge_core::Context;
use playforge_core::blueprint::MAX_MODULES;

/// Distinct academic markers needed before a context counts as scholarly.
const ACADEMIC_SIGNAL_FLOOR: usize = 2;

const ACADEMIC_SIGNALS: &[&str] = &[
    "abstract",
    "doi",
    "references",
    "bibliography",
    "journal",
    "university",
    "hypothesis",
    "methodology",
    "论文",
    "研究",
    "期刊",
    "文献",
];

fn is_cjk_digit(ch: char) -> bool {
    ch.is_ascii_digit() || "一二三四五六七八九十百千".contains(ch)
}

/// Does a line look like a chapter/section heading?
fn is_heading_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 80 {
        return false;
    }
    let lower = trimmed.to_lowercase();
    for prefix in ["chapter ", "ch. ", "part ", "section "] {
        if let Some(rest) = lower.strip_prefix(prefix) {
            if rest.chars().next().is_some_and(|c| c.is_ascii_digit() || c.is_ascii_alphabetic()) {
                return true;
            }
        }
    }
    // 第N章 / 第N节 anywhere in the line.
    let chars: Vec<char> = trimmed.chars().collect();
    for (i, ch) in chars.iter().enumerate() {
        if *ch != '第' {
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && is_cjk_digit(chars[j]) {
            j += 1;
        }
        if j > i + 1 && j < chars.len() && matches!(chars[j], '章' | '节') {
            return true;
        }
    }
    false
}

fn char_bucket_estimate(chars: usize) -> usize {
    match chars {
        0..=5_000 => 1,
        5_001..=14_000 => 2,
        14_001..=28_000 => 3,
        28_001..=44_000 => 4,
        44_001..=62_000 => 5,
        _ => 6,
    }
}

fn academic_signal_count(text: &str) -> usize {
    let lower = text.to_lowercase();
    ACADEMIC_SIGNALS.iter().filter(|signal| lower.contains(*signal)).count()
}

/// Estimate the module count for a context, in `1..=MAX_MODULES`.
///
/// Structure (detected headings) wins over raw length; academic material
/// and multi-source web research each nudge the floor up; a single thin
/// source caps the ceiling.
pub fn estimate_module_count(context: &Context) -> usize {
    let chars = context.char_len();
    let heading_count = context.text.lines().filter(|line| is_heading_line(line)).count();

    let mut estimate = if heading_count >= 2 {
        heading_count.min(MAX_MODULES)
    } else {
        char_bucket_estimate(chars)
    };

    if academic_signal_count(&context.text) >= ACADEMIC_SIGNAL_FLOOR {
        let floor = if chars >= 3_000 { 3 } else { 2 };
        estimate = estimate.max(floor);
    }
    if context.has_web_sources() && chars >= 1_600 {
        estimate = estimate.max(2);
    }
    if context.sources.len() >= 5 {
        estimate += 1;
    }
    if context.sources.len() <= 1 {
        estimate = estimate.min(4);
    }
    estimate.clamp(1, MAX_MODULES)
}
