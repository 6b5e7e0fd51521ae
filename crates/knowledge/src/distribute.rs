//! Assign pack items to modules.
//!
//! Hint resolution order: valid 1-based numeric hint, then fuzzy title
//! match, then round-robin by item position. Questions prefer the module
//! that received their anchored glossary entry.

use std::collections::HashMap;

use playforge_core::knowledge::{KnowledgeBattle, KnowledgePack, LocalPack};
use tracing::debug;

use crate::fallback::auto_question;

/// Split one pack across `module_titles.len()` modules. Always returns
/// one `LocalPack` per module, in order.
pub fn distribute(pack: &KnowledgePack, module_titles: &[String]) -> Vec<LocalPack> {
    let count = module_titles.len().max(1);
    let mut skills: Vec<Vec<_>> = vec![Vec::new(); count];
    let mut entries: Vec<Vec<_>> = vec![Vec::new(); count];
    let mut questions: Vec<Vec<_>> = vec![Vec::new(); count];

    // Entry placement first, so questions can co-locate with their entry.
    let mut entry_slot: HashMap<&str, usize> = HashMap::new();
    for (position, entry) in pack.entries.iter().enumerate() {
        let slot = resolve_slot(entry.module_hint.as_deref(), position, module_titles);
        entry_slot.insert(entry.id.as_str(), slot);
        entries[slot].push(entry.clone());
    }

    for (position, skill) in pack.skills.iter().enumerate() {
        let slot = resolve_slot(skill.module_hint.as_deref(), position, module_titles);
        skills[slot].push(skill.clone());
    }

    for (position, question) in pack.questions.iter().enumerate() {
        let slot = question
            .entry_id
            .as_deref()
            .and_then(|id| entry_slot.get(id).copied())
            .unwrap_or_else(|| {
                resolve_slot(question.module_hint.as_deref(), position, module_titles)
            });
        questions[slot].push(question.clone());
    }

    // No module plays an empty battle if it has entries to quiz on.
    for slot in 0..count {
        if questions[slot].is_empty() && !entries[slot].is_empty() {
            debug!(module = slot + 1, "backfilling battle questions from local entries");
            questions[slot] = entries[slot]
                .iter()
                .take(3)
                .map(|entry| auto_question(entry, &pack.entries))
                .collect();
        }
    }

    skills
        .into_iter()
        .zip(entries)
        .zip(questions)
        .map(|((skills, entries), questions)| LocalPack {
            skills,
            entries,
            battle: KnowledgeBattle::new(questions),
        })
        .collect()
}

fn resolve_slot(hint: Option<&str>, position: usize, module_titles: &[String]) -> usize {
    let count = module_titles.len().max(1);
    let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
        return position % count;
    };

    if let Ok(number) = hint.parse::<usize>() {
        if (1..=count).contains(&number) {
            return number - 1;
        }
        return position % count;
    }

    let hint_lower = hint.to_lowercase();
    for (index, title) in module_titles.iter().enumerate() {
        let title_lower = title.to_lowercase();
        if title_lower.contains(&hint_lower) || hint_lower.contains(&title_lower) {
            return index;
        }
    }
    position % count
}

#[cfg(test)]
mod tests {
    use super::*;
    use playforge_core::knowledge::{QuizQuestion, SkillPoint, ThinkTankEntry};

    fn titles() -> Vec<String> {
        vec!["Act 1: The Levy".into(), "Act 2: The Collapse".into(), "Act 3: The Reform".into()]
    }

    fn entry(term: &str, hint: Option<&str>) -> ThinkTankEntry {
        ThinkTankEntry {
            term: term.into(),
            title: term.into(),
            summary: format!("{term} summary"),
            module_hint: hint.map(str::to_string),
            ..Default::default()
        }
        .normalized()
    }

    fn question(prompt: &str, entry_id: Option<&str>, hint: Option<&str>) -> QuizQuestion {
        QuizQuestion {
            prompt: prompt.into(),
            options: vec!["a".into(), "b".into()],
            entry_id: entry_id.map(str::to_string),
            module_hint: hint.map(str::to_string),
            ..Default::default()
        }
        .normalized()
    }

    #[test]
    fn numeric_hints_win() {
        let pack = KnowledgePack {
            entries: vec![entry("grain", Some("3"))],
            ..Default::default()
        };
        let local = distribute(&pack, &titles());
        assert!(local[2].entries.iter().any(|e| e.term == "grain"));
        assert!(local[0].entries.is_empty());
    }

    #[test]
    fn title_fragments_match_fuzzily() {
        let pack = KnowledgePack {
            entries: vec![entry("debasement", Some("the collapse"))],
            ..Default::default()
        };
        let local = distribute(&pack, &titles());
        assert_eq!(local[1].entries.len(), 1);
    }

    #[test]
    fn unhinted_items_round_robin() {
        let pack = KnowledgePack {
            skills: (0..5)
                .map(|i| SkillPoint { name: format!("skill {i}"), ..Default::default() }.normalized())
                .collect(),
            ..Default::default()
        };
        let local = distribute(&pack, &titles());
        assert_eq!(local[0].skills.len(), 2);
        assert_eq!(local[1].skills.len(), 2);
        assert_eq!(local[2].skills.len(), 1);
    }

    #[test]
    fn questions_follow_their_entry() {
        let pack = KnowledgePack {
            entries: vec![entry("grain", Some("2"))],
            questions: vec![question("Where did grain go?", Some("grain"), Some("1"))],
            ..Default::default()
        };
        let local = distribute(&pack, &titles());
        // The entry hint moved it to module 2; its question ignores its
        // own hint and follows.
        assert_eq!(local[1].battle.questions.len(), 1);
        assert!(local[0].battle.questions.is_empty());
    }

    #[test]
    fn empty_battles_are_backfilled_from_local_entries() {
        let pack = KnowledgePack {
            entries: vec![entry("grain", Some("1")), entry("levy", Some("2"))],
            ..Default::default()
        };
        let local = distribute(&pack, &titles());
        assert_eq!(local[0].battle.questions.len(), 1);
        assert_eq!(local[0].battle.questions[0].entry_id.as_deref(), Some("grain"));
        assert_eq!(local[1].battle.questions.len(), 1);
        assert!(local[2].battle.questions.is_empty());
        assert_eq!(local[2].battle.pass_score, 0);
    }

    #[test]
    fn invalid_numeric_hint_falls_back_to_position() {
        let pack = KnowledgePack {
            entries: vec![entry("grain", Some("9"))],
            ..Default::default()
        };
        let local = distribute(&pack, &titles());
        assert_eq!(local[0].entries.len(), 1);
    }

    #[test]
    fn pass_score_tracks_question_count() {
        let pack = KnowledgePack {
            entries: vec![
                entry("grain", Some("1")),
                entry("levy", Some("1")),
                entry("treasury", Some("1")),
            ],
            ..Default::default()
        };
        let local = distribute(&pack, &titles());
        assert_eq!(local[0].battle.questions.len(), 3);
        assert_eq!(local[0].battle.max_score, 3);
        assert_eq!(local[0].battle.pass_score, 2);
    }
}
