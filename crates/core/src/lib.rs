//! Core domain types and traits for the PlayForge generation pipeline.
//!
//! Everything downstream crates share lives here: the error taxonomy,
//! source/context/blueprint/knowledge data model, the generative backend
//! seam, progress events, and cancellation.

pub mod backend;
pub mod blueprint;
pub mod cancel;
pub mod compile;
pub mod error;
pub mod grounding;
pub mod hash;
pub mod knowledge;
pub mod progress;
pub mod source;
pub mod text;

pub use backend::{GenerationRequest, GenerativeBackend};
pub use blueprint::{Blueprint, ChoiceOption, Effects, ModulePlan, Round};
pub use cancel::CancelSignal;
pub use compile::{CompiledModule, ModuleManifest, RenderTier};
pub use error::{
    BackendError, CapabilityError, Error, InputError, QualityError, RenderError, Result,
    StoreError,
};
pub use grounding::{DensityIssue, GroundingReport};
pub use knowledge::{
    KnowledgeBattle, KnowledgePack, LocalPack, QuizQuestion, SkillPoint, ThinkTankEntry,
};
pub use progress::{CollectingProgress, ProgressEvent, ProgressSink, SilentProgress, Step};
pub use source::{Context, Source, SourceOrigin, dedupe_sources};
