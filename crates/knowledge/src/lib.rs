//! Knowledge pack synthesis and distribution for PlayForge.

pub mod distribute;
pub mod fallback;
pub mod synth;

pub use distribute::distribute;
pub use fallback::{auto_question, fallback_pack};
pub use synth::synthesize_knowledge;
