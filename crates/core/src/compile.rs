//! Compiled-module artifacts and the tiers that can produce them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which renderer produced a module's HTML.
///
/// Tiers are tried in declaration order; the first valid candidate wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTier {
    /// External design bridge webhook.
    Bridge,
    /// Direct generative HTML.
    Generative,
    /// Deterministic built-in template.
    Template,
}

impl std::fmt::Display for RenderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bridge => "bridge",
            Self::Generative => "generative",
            Self::Template => "template",
        };
        f.write_str(name)
    }
}

/// One finished playable module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledModule {
    pub slug: String,
    /// 1-based position within the experience.
    pub order: usize,
    pub title: String,
    /// Self-contained HTML document.
    pub html: String,
    pub generated_by: RenderTier,
    pub generated_at: DateTime<Utc>,
}

impl CompiledModule {
    /// The metadata persisted next to `code.html`, without the document
    /// body itself.
    pub fn manifest(&self) -> ModuleManifest {
        ModuleManifest {
            slug: self.slug.clone(),
            order: self.order,
            title: self.title.clone(),
            generated_by: self.generated_by,
            generated_at: self.generated_at,
        }
    }
}

/// Contents of a module's `module.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub slug: String,
    pub order: usize,
    pub title: String,
    pub generated_by: RenderTier,
    pub generated_at: DateTime<Utc>,
}
