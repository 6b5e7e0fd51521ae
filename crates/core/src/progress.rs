//! Progress reporting for long generation runs.
//!
//! The pipeline emits coarse, monotonic percent updates at stage
//! boundaries. Sinks are synchronous and must be cheap; anything slow
//! belongs behind a channel.

use serde::{Deserialize, Serialize};

/// Pipeline stage a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    PrepareSources,
    BuildContext,
    Blueprint,
    Knowledge,
    Design,
    Modules,
    Persist,
    Done,
}

/// One progress update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: Step,
    /// Overall completion, `0..=100`.
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(step: Step, percent: u8, message: impl Into<String>) -> Self {
        Self { step, percent: percent.min(100), message: message.into() }
    }
}

/// Receives progress updates from a running pipeline.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Discards all events; the default when callers don't care.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Collects events in memory, for tests and batch callers.
#[derive(Debug, Default)]
pub struct CollectingProgress {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl CollectingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("progress lock").clone()
    }
}

impl ProgressSink for CollectingProgress {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().expect("progress lock").push(event);
    }
}
