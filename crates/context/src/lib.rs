//! Context aggregation and analysis for PlayForge.
//!
//! Turns raw inputs into a normalized [`playforge_core::Context`], then
//! derives the grounding vocabulary, module-count estimate, and evidence
//! digests the downstream stages consume.

pub mod builder;
pub mod digest;
pub mod scope;
pub mod terms;

pub use builder::{SourceInputs, build_context};
pub use digest::{
    DEFAULT_DIGEST_BULLETS, DEFAULT_DIGEST_CHARS, DEFAULT_SNIPPET_CHARS, evidence_digest,
    focused_snippet,
};
pub use scope::estimate_module_count;
pub use terms::{DEFAULT_TERM_LIMIT, extract_grounding_terms, term_overlap};
