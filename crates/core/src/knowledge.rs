//! Knowledge-pack types: skill points, think-tank entries, and quiz
//! questions, plus the per-module battle bundle.
//!
//! Field caps mirror the runtime catalog contract; `normalized()` on each
//! type is idempotent, so re-normalizing loaded data is always safe.

use serde::{Deserialize, Serialize};

use crate::text::{clamp_chars, collapse_whitespace, slugify};

/// One trainable skill extracted from the source material.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillPoint {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// 1 (intro) through 5 (expert).
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// Optional module the author intended this skill for: a 1-based
    /// index or a module title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hint: Option<String>,
}

fn default_difficulty() -> u8 {
    2
}

impl SkillPoint {
    pub fn normalized(mut self) -> Self {
        self.id = text_id(&self.id, &self.name, "skill");
        self.name = clamp_chars(collapse_whitespace(&self.name).as_str(), 88);
        self.description = clamp_chars(collapse_whitespace(&self.description).as_str(), 320);
        self.category = clamp_chars(collapse_whitespace(&self.category).as_str(), 48);
        self.keywords = cap_list(self.keywords, 8, 40);
        self.difficulty = self.difficulty.clamp(1, 5);
        self
    }
}

/// One concept card in the cross-document think tank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThinkTankEntry {
    /// Slug of the term; the merge key across documents.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// The transferable takeaway, distinct from the summary.
    #[serde(default)]
    pub insight: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hint: Option<String>,
}

impl ThinkTankEntry {
    pub fn normalized(mut self) -> Self {
        self.term = clamp_chars(collapse_whitespace(&self.term).as_str(), 72);
        self.id = {
            let slug = slugify(&self.term);
            if slug.is_empty() { slugify(&self.title) } else { slug }
        };
        self.title = clamp_chars(collapse_whitespace(&self.title).as_str(), 88);
        self.summary = clamp_chars(collapse_whitespace(&self.summary).as_str(), 360);
        self.insight = clamp_chars(collapse_whitespace(&self.insight).as_str(), 320);
        self.tags = cap_list(self.tags, 10, 40);
        self.related_terms = cap_list(self.related_terms, 10, 72);
        self
    }

    /// An entry is usable once it has a merge key and a term.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.term.trim().is_empty()
    }
}

/// One multiple-choice question in a knowledge battle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, alias = "answerIndex")]
    pub answer_index: usize,
    #[serde(default)]
    pub explanation: String,
    /// The skill this question trains, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
    /// The think-tank entry this question is anchored to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_hint: Option<String>,
}

impl QuizQuestion {
    pub fn normalized(mut self) -> Self {
        self.id = text_id(&self.id, &self.prompt, "question");
        self.prompt = clamp_chars(collapse_whitespace(&self.prompt).as_str(), 220);
        self.options = cap_list(self.options, 4, 120);
        if self.options.is_empty() {
            self.answer_index = 0;
        } else if self.answer_index >= self.options.len() {
            self.answer_index = 0;
        }
        self.explanation = clamp_chars(collapse_whitespace(&self.explanation).as_str(), 260);
        self
    }

    /// A question is playable with at least two distinct options.
    pub fn is_valid(&self) -> bool {
        !self.prompt.trim().is_empty() && self.options.len() >= 2
    }
}

/// The quiz bundle attached to one module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBattle {
    pub questions: Vec<QuizQuestion>,
    pub max_score: u32,
    pub pass_score: u32,
}

impl KnowledgeBattle {
    /// One point per question; pass at 60% (ceiling), clamped to
    /// `[1, questions]`. An empty battle scores zero.
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let max_score = questions.len() as u32;
        let pass_score = if max_score == 0 {
            0
        } else {
            ((max_score as f64 * 0.6).ceil() as u32).clamp(1, max_score)
        };
        Self { questions, max_score, pass_score }
    }
}

/// Everything the knowledge stage produces for one experience.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgePack {
    /// One-paragraph summary of the whole document.
    #[serde(default, alias = "bookSummary")]
    pub summary: String,
    pub skills: Vec<SkillPoint>,
    pub entries: Vec<ThinkTankEntry>,
    pub questions: Vec<QuizQuestion>,
}

impl KnowledgePack {
    pub fn normalized(self) -> Self {
        Self {
            summary: clamp_chars(collapse_whitespace(&self.summary).as_str(), 420),
            skills: self.skills.into_iter().map(SkillPoint::normalized).collect(),
            entries: self
                .entries
                .into_iter()
                .map(ThinkTankEntry::normalized)
                .filter(ThinkTankEntry::is_valid)
                .collect(),
            questions: self
                .questions
                .into_iter()
                .map(QuizQuestion::normalized)
                .filter(QuizQuestion::is_valid)
                .collect(),
        }
    }

    /// Empty means nothing distributable; the summary alone does not
    /// make a pack.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.entries.is_empty() && self.questions.is_empty()
    }
}

/// The slice of the pack assigned to one module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalPack {
    pub skills: Vec<SkillPoint>,
    pub entries: Vec<ThinkTankEntry>,
    pub battle: KnowledgeBattle,
}

fn cap_list(items: Vec<String>, max_items: usize, max_chars: usize) -> Vec<String> {
    items
        .into_iter()
        .map(|s| clamp_chars(collapse_whitespace(&s).as_str(), max_chars))
        .filter(|s| !s.is_empty())
        .take(max_items)
        .collect()
}

fn text_id(id: &str, fallback_text: &str, prefix: &str) -> String {
    let trimmed = id.trim();
    if !trimmed.is_empty() {
        return slugify(trimmed);
    }
    let slug = slugify(fallback_text);
    if slug.is_empty() {
        format!("{prefix}-{}", crate::hash::stable_hash(fallback_text))
    } else {
        slug
    }
}
