//! Persistent state for PlayForge: the cross-document think-tank graph
//! and the generation-record catalog. Both are single JSON files with
//! atomic temp-file-then-rename rewrites.

pub mod catalog;
pub mod think_tank;

pub use catalog::{GenerationCatalog, GenerationRecord};
pub use think_tank::{BookKnowledgeSummary, MergeReport, RelationRef, StoredEntry, ThinkTankStore};
