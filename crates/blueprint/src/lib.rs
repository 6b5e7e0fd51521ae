//! Scenario blueprint synthesis: prompting, normalization, quality
//! gates, and the deterministic fallback.

pub mod fallback;
pub mod normalize;
pub mod prompt;
pub mod quality;
pub mod synth;

pub use fallback::fallback_blueprint;
pub use normalize::normalize_blueprint;
pub use prompt::{BLUEPRINT_SYSTEM, RetryHints, build_blueprint_prompt};
pub use quality::{assess_grounding, find_density_issue};
pub use synth::synthesize_blueprint;
