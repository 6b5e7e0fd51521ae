//! Deterministic knowledge pack built purely from the evidence index.
//!
//! Every field has a pure fallback so the knowledge stage never
//! dead-ends without a generative backend.

use playforge_core::Context;
use playforge_core::knowledge::{KnowledgePack, QuizQuestion, SkillPoint, ThinkTankEntry};
use playforge_core::text::{clamp_chars, split_sentences};

const MAX_SKILLS: usize = 8;
const MAX_ENTRIES: usize = 12;
const MAX_QUESTIONS: usize = 8;

/// Build a complete pack from grounding terms and top sentences.
pub fn fallback_pack(context: &Context, terms: &[String]) -> KnowledgePack {
    let sentences = split_sentences(&context.text);
    let terms = usable_terms(terms, &context.title);

    let summary = build_summary(context, &terms, &sentences);
    // Entries get their slug ids here so questions can anchor to them.
    let entries: Vec<ThinkTankEntry> = terms
        .iter()
        .take(MAX_ENTRIES)
        .enumerate()
        .map(|(index, term)| {
            build_entry(term, &terms, &sentences, &context.title, index).normalized()
        })
        .collect();
    let skills: Vec<SkillPoint> = terms
        .iter()
        .take(MAX_SKILLS)
        .enumerate()
        .map(|(index, term)| build_skill(term, &terms, &sentences, index))
        .collect();
    let questions = build_questions(&entries);

    KnowledgePack { summary, skills, entries, questions }.normalized()
}

/// Definition-recognition question for one glossary entry: the correct
/// option is the entry's own summary, decoys come from its neighbours.
pub fn auto_question(entry: &ThinkTankEntry, pool: &[ThinkTankEntry]) -> QuizQuestion {
    let correct = clamp_chars(&entry.summary, 120);
    let mut options: Vec<String> = vec![correct.clone()];
    for other in pool {
        if other.id == entry.id {
            continue;
        }
        let decoy = clamp_chars(&other.summary, 120);
        if !decoy.is_empty() && !options.contains(&decoy) {
            options.push(decoy);
        }
        if options.len() == 4 {
            break;
        }
    }
    if options.len() < 2 {
        options.push("This idea does not appear in the source material.".into());
    }

    // Rotate the correct answer deterministically by term.
    let offset = playforge_core::hash::stable_hash(&entry.term) as usize % options.len();
    options.rotate_right(offset);
    let answer_index = options.iter().position(|o| *o == correct).unwrap_or(0);

    QuizQuestion {
        id: format!("q-{}", entry.id),
        prompt: format!("Which statement best matches \"{}\"?", entry.term),
        options,
        answer_index,
        explanation: if entry.insight.is_empty() {
            entry.summary.clone()
        } else {
            entry.insight.clone()
        },
        skill_id: None,
        entry_id: Some(entry.id.clone()),
        module_hint: None,
    }
}

fn usable_terms(terms: &[String], title: &str) -> Vec<String> {
    if !terms.is_empty() {
        return terms.to_vec();
    }
    // A bare-topic run has no vocabulary yet; key everything off the title.
    vec![title.to_string()]
}

fn build_summary(context: &Context, terms: &[String], sentences: &[String]) -> String {
    let mut ranked: Vec<(usize, usize, &String)> = sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| {
            let lower = sentence.to_lowercase();
            let hits = terms.iter().filter(|t| lower.contains(t.as_str())).count();
            (hits, index, sentence)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let picked: Vec<&str> = ranked.iter().take(3).map(|(_, _, s)| s.as_str()).collect();
    if picked.is_empty() {
        format!("\"{}\" distilled into a playable decision experience.", context.title)
    } else {
        picked.join(" ")
    }
}

fn sentence_for<'a>(term: &str, sentences: &'a [String], fallback: &'a str) -> &'a str {
    sentences
        .iter()
        .find(|s| s.to_lowercase().contains(term))
        .map(String::as_str)
        .unwrap_or_else(|| sentences.first().map(String::as_str).unwrap_or(fallback))
}

fn neighbours(terms: &[String], index: usize, count: usize) -> Vec<String> {
    (1..=count)
        .filter_map(|step| terms.get((index + step) % terms.len().max(1)))
        .filter(|t| t.as_str() != terms[index])
        .cloned()
        .collect()
}

fn build_entry(
    term: &str,
    terms: &[String],
    sentences: &[String],
    title: &str,
    index: usize,
) -> ThinkTankEntry {
    let evidence = sentence_for(term, sentences, title);
    ThinkTankEntry {
        id: String::new(),
        term: term.to_string(),
        title: term.to_string(),
        summary: evidence.to_string(),
        insight: format!(
            "\"{term}\" shapes the key decisions in \"{title}\"; look for the same constraint \
             when it appears elsewhere."
        ),
        tags: vec![term.to_string()],
        related_terms: neighbours(terms, index, 3),
        module_hint: None,
    }
}

fn build_skill(term: &str, terms: &[String], sentences: &[String], index: usize) -> SkillPoint {
    SkillPoint {
        id: String::new(),
        name: format!("Reasoning with {term}"),
        description: sentence_for(term, sentences, term).to_string(),
        category: "core".into(),
        keywords: {
            let mut keywords = vec![term.to_string()];
            keywords.extend(neighbours(terms, index, 2));
            keywords
        },
        // Later terms rank lower in the evidence, so they read as harder.
        difficulty: 2 + (index / 4) as u8,
        module_hint: None,
    }
}

fn build_questions(entries: &[ThinkTankEntry]) -> Vec<QuizQuestion> {
    entries.iter().take(MAX_QUESTIONS).map(|entry| auto_question(entry, entries)).collect()
}
