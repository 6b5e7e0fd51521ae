//! Grounding-vocabulary extraction.
//!
//! The vocabulary is the set of concrete terms a blueprint must echo to
//! count as grounded in the source material: frequency-ranked Latin
//! tokens and CJK runs, minus structural stop words.

use std::collections::HashMap;

/// Default number of grounding terms to keep.
pub const DEFAULT_TERM_LIMIT: usize = 36;

const LATIN_STOP_WORDS: &[&str] = &[
    "the", "and", "that", "this", "with", "from", "for", "are", "was", "were", "have", "has",
    "had", "not", "but", "his", "her", "they", "them", "their", "there", "then", "than", "its",
    "into", "out", "about", "over", "under", "between", "after", "before", "when", "while",
    "where", "which", "who", "whom", "what", "how", "why", "can", "could", "would", "should",
    "will", "shall", "may", "might", "must", "been", "being", "all", "each", "every", "some",
    "any", "more", "most", "other", "such", "only", "also", "just", "very", "too", "own",
    "same", "one", "two", "three", "first", "second", "third", "new", "old", "many", "much",
    // schema words models echo back
    "title", "module", "round", "option", "label", "feedback", "effects", "prompt", "json",
    "chapter", "section", "page", "content", "text", "book", "part",
];

const CJK_STOP_WORDS: &[&str] = &[
    "我们", "他们", "她们", "你们", "这个", "那个", "这些", "那些", "一个", "一些", "可以",
    "不是", "就是", "但是", "因为", "所以", "如果", "虽然", "而且", "或者", "以及", "对于",
    "关于", "通过", "没有", "已经", "正在", "非常", "比较", "其中", "之后", "之前", "时候",
    "进行", "作为", "成为", "能够", "需要", "不同", "这样", "那样", "什么", "怎么", "为了",
    // schema words
    "标题", "模块", "回合", "选项", "反馈", "内容", "章节", "文本",
];

fn is_cjk(ch: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&ch)
}

/// Tokenize into candidate terms: lowercase Latin tokens of 3+ chars and
/// CJK runs of 2-8 chars (longer runs are chunked).
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut latin = String::new();
    let mut cjk = String::new();

    let flush_latin = |buf: &mut String, out: &mut Vec<String>| {
        if buf.chars().count() >= 3 && buf.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            out.push(std::mem::take(buf));
        } else {
            buf.clear();
        }
    };
    let flush_cjk = |buf: &mut String, out: &mut Vec<String>| {
        let chars: Vec<char> = buf.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let take = (chars.len() - i).min(8);
            if take >= 2 {
                out.push(chars[i..i + take].iter().collect());
            }
            i += take;
        }
        buf.clear();
    };

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            if !cjk.is_empty() {
                flush_cjk(&mut cjk, &mut tokens);
            }
            latin.push(ch.to_ascii_lowercase());
        } else if is_cjk(ch) {
            if !latin.is_empty() {
                flush_latin(&mut latin, &mut tokens);
            }
            cjk.push(ch);
        } else {
            if !latin.is_empty() {
                flush_latin(&mut latin, &mut tokens);
            }
            if !cjk.is_empty() {
                flush_cjk(&mut cjk, &mut tokens);
            }
        }
    }
    if !latin.is_empty() {
        flush_latin(&mut latin, &mut tokens);
    }
    if !cjk.is_empty() {
        flush_cjk(&mut cjk, &mut tokens);
    }
    tokens
}

fn is_stop_word(term: &str) -> bool {
    LATIN_STOP_WORDS.contains(&term) || CJK_STOP_WORDS.contains(&term)
}

/// Extract the grounding vocabulary from context text, frequency-ranked.
///
/// Keeps at least 8 terms even when `limit` is smaller.
pub fn extract_grounding_terms(text: &str, limit: usize) -> Vec<String> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for token in tokenize(text) {
        if is_stop_word(&token) {
            continue;
        }
        let entry = frequencies.entry(token.clone()).or_insert(0);
        if *entry == 0 {
            order.push(token);
        }
        *entry += 1;
    }

    // Frequency descending; first-seen order breaks ties so the ranking
    // is deterministic.
    order.sort_by(|a, b| frequencies[b].cmp(&frequencies[a]));
    order.truncate(limit.max(8));
    order
}

/// How many of `terms` appear in `haystack` (case-insensitive), with the
/// matched and missing partitions.
pub fn term_overlap(haystack: &str, terms: &[String]) -> (Vec<String>, Vec<String>) {
    let lower = haystack.to_lowercase();
    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for term in terms {
        if lower.contains(term.as_str()) {
            matched.push(term.clone());
        } else {
            missing.push(term.clone());
        }
    }
    (matched, missing)
}
