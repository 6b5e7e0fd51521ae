//! Persistent cross-document think tank.
//!
//! One JSON file holds every glossary entry ever merged, with provenance
//! and precomputed relations. Entries load on open; every merge rewrites
//! the file atomically (temp file then rename) under a single async
//! mutex, so merges from concurrent generations serialize.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use playforge_core::error::{Error, StoreError};
use playforge_core::knowledge::{LocalPack, ThinkTankEntry};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const MAX_RELATIONS: usize = 10;
const MIN_RELATION_SCORE: u32 = 2;
const MAX_TAGS: usize = 10;
const MAX_RELATED_TERMS: usize = 10;
const MAX_PROVENANCE: usize = 24;

/// A scored link between two stored entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationRef {
    pub id: String,
    pub title: String,
    pub score: u32,
}

/// One glossary entry with cross-document provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: String,
    pub term: String,
    pub title: String,
    pub summary: String,
    pub insight: String,
    pub tags: Vec<String>,
    pub related_terms: Vec<String>,
    /// Document ids this entry was seen in.
    pub books: Vec<String>,
    /// Module slugs this entry was assigned to.
    pub modules: Vec<String>,
    #[serde(default)]
    pub relations: Vec<RelationRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredEntry {
    fn from_entry(entry: &ThinkTankEntry, book_id: &str, module_slug: &str) -> Self {
        let now = Utc::now();
        Self {
            id: entry.id.clone(),
            term: entry.term.clone(),
            title: entry.title.clone(),
            summary: entry.summary.clone(),
            insight: entry.insight.clone(),
            tags: entry.tags.clone(),
            related_terms: entry.related_terms.clone(),
            books: vec![book_id.to_string()],
            modules: vec![module_slug.to_string()],
            relations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold a fresh sighting of the same term into this entry.
    fn absorb(&mut self, entry: &ThinkTankEntry, book_id: &str, module_slug: &str) {
        if self.summary.is_empty() {
            self.summary = entry.summary.clone();
        }
        if self.insight.is_empty() {
            self.insight = entry.insight.clone();
        }
        union_into(&mut self.tags, &entry.tags, MAX_TAGS);
        union_into(&mut self.related_terms, &entry.related_terms, MAX_RELATED_TERMS);
        push_unique(&mut self.books, book_id, MAX_PROVENANCE);
        push_unique(&mut self.modules, module_slug, MAX_PROVENANCE);
        self.updated_at = Utc::now();
    }
}

/// Outcome of one document merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    pub total_entries: usize,
}

/// Per-document rollup kept alongside the entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookKnowledgeSummary {
    pub title: String,
    pub summary: String,
    pub skill_count: usize,
    pub entry_count: usize,
    pub question_count: usize,
    pub merged_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    entries: Vec<StoredEntry>,
    #[serde(default)]
    books: BTreeMap<String, BookKnowledgeSummary>,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: Vec<StoredEntry>,
    books: BTreeMap<String, BookKnowledgeSummary>,
}

pub struct ThinkTankStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl ThinkTankStore {
    /// Open the store, loading any existing file. A missing file is an
    /// empty store; an unreadable one is an error, not silent data loss.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let file: StoreFile = serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
                StoreState { entries: file.entries, books: file.books }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", path.display())).into()),
        };
        debug!(path = %path.display(), count = state.entries.len(), "think tank loaded");
        Ok(Self { path, state: Mutex::new(state) })
    }

    /// Merge one document's distributed packs, then recompute relations
    /// over the whole store and rewrite the file. Re-merging the same
    /// document replaces its rollup, not its provenance.
    pub async fn merge(
        &self,
        book_id: &str,
        title: &str,
        summary: &str,
        local_packs: &[(String, LocalPack)],
    ) -> Result<MergeReport, Error> {
        let mut state = self.state.lock().await;
        let mut inserted = 0usize;
        let mut updated = 0usize;

        for (module_slug, pack) in local_packs {
            for entry in &pack.entries {
                if !entry.is_valid() {
                    warn!(term = %entry.term, "skipping invalid entry in merge");
                    continue;
                }
                match state.entries.iter_mut().find(|stored| stored.id == entry.id) {
                    Some(stored) => {
                        stored.absorb(entry, book_id, module_slug);
                        updated += 1;
                    }
                    None => {
                        state.entries.push(StoredEntry::from_entry(entry, book_id, module_slug));
                        inserted += 1;
                    }
                }
            }
        }

        state.books.insert(
            book_id.to_string(),
            BookKnowledgeSummary {
                title: title.to_string(),
                summary: summary.to_string(),
                skill_count: local_packs.iter().map(|(_, p)| p.skills.len()).sum(),
                entry_count: local_packs.iter().map(|(_, p)| p.entries.len()).sum(),
                question_count: local_packs.iter().map(|(_, p)| p.battle.questions.len()).sum(),
                merged_at: Utc::now(),
            },
        );

        recompute_relations(&mut state.entries);
        self.rewrite(&state).await?;

        let report = MergeReport { inserted, updated, total_entries: state.entries.len() };
        info!(book = book_id, inserted, updated, total = report.total_entries, "think tank merged");
        Ok(report)
    }

    /// Snapshot of all entries, for listing and lookup.
    pub async fn entries(&self) -> Vec<StoredEntry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn get(&self, id: &str) -> Option<StoredEntry> {
        self.state.lock().await.entries.iter().find(|entry| entry.id == id).cloned()
    }

    /// Per-document rollups, keyed by document id.
    pub async fn book_summaries(&self) -> BTreeMap<String, BookKnowledgeSummary> {
        self.state.lock().await.books.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn rewrite(&self, state: &StoreState) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
        }
        let file = StoreFile { entries: state.entries.clone(), books: state.books.clone() };
        let raw = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }
}

/// Full pairwise recompute: score = shared tags, +1 when the two entries
/// come from disjoint document sets (a cross-document bridge). O(n²) by
/// design; the expected corpus is low thousands of entries.
fn recompute_relations(entries: &mut [StoredEntry]) {
    let snapshots: Vec<(String, String, HashSet<String>, HashSet<String>)> = entries
        .iter()
        .map(|entry| {
            (
                entry.id.clone(),
                entry.title.clone(),
                entry.tags.iter().map(|t| t.to_lowercase()).collect(),
                entry.books.iter().cloned().collect(),
            )
        })
        .collect();

    for (index, entry) in entries.iter_mut().enumerate() {
        let (_, _, own_tags, own_books) = &snapshots[index];
        let mut relations: Vec<RelationRef> = snapshots
            .iter()
            .enumerate()
            .filter(|(other_index, _)| *other_index != index)
            .filter_map(|(_, (other_id, other_title, other_tags, other_books))| {
                let mut score = own_tags.intersection(other_tags).count() as u32;
                if own_books.is_disjoint(other_books) {
                    score += 1;
                }
                (score >= MIN_RELATION_SCORE).then(|| RelationRef {
                    id: other_id.clone(),
                    title: other_title.clone(),
                    score,
                })
            })
            .collect();
        relations.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        relations.truncate(MAX_RELATIONS);
        entry.relations = relations;
    }
}

fn union_into(target: &mut Vec<String>, incoming: &[String], cap: usize) {
    for item in incoming {
        if target.len() >= cap {
            break;
        }
        if !target.iter().any(|t| t.eq_ignore_ascii_case(item)) {
            target.push(item.clone());
        }
    }
}

fn push_unique(target: &mut Vec<String>, item: &str, cap: usize) {
    if target.len() < cap && !target.iter().any(|t| t == item) {
        target.push(item.to_string());
    }
}
