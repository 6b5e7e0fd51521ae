//! Tiered module compiler for PlayForge.
//!
//! Three renderer tiers produce a module's single-file HTML document:
//! an optional external design bridge, the generative backend, and a
//! deterministic built-in template. Candidates from the first two tiers
//! pass heuristic gates before being accepted.

pub mod bridge;
pub mod design;
pub mod generative;
pub mod job;
pub mod render;
pub mod template;
pub mod validate;

pub use bridge::BridgeRenderer;
pub use design::{DesignChoice, DesignDirection, design_for};
pub use job::RenderJob;
pub use render::ModuleCompiler;
pub use template::render_template;
pub use validate::{
    has_basic_interaction_signals, has_obvious_empty_ui_slots, has_rich_interaction_signals,
    looks_like_rigid_binary_template, validate_candidate,
};
