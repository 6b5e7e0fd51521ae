//! Tier orchestration: bridge, then generative, then template.

use std::sync::Arc;

use chrono::Utc;
use playforge_core::backend::GenerativeBackend;
use playforge_core::compile::{CompiledModule, RenderTier};
use playforge_core::error::{Error, RenderError};
use tracing::{info, warn};

use crate::bridge::BridgeRenderer;
use crate::generative::render_generative;
use crate::job::RenderJob;
use crate::template::render_template;

pub struct ModuleCompiler {
    backend: Arc<dyn GenerativeBackend>,
    bridge: Option<BridgeRenderer>,
    /// When set, the template tier is disabled and a run without a valid
    /// bridge or generative candidate fails.
    require_generative_html: bool,
}

impl ModuleCompiler {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        bridge: Option<BridgeRenderer>,
        require_generative_html: bool,
    ) -> Self {
        Self { backend, bridge, require_generative_html }
    }

    /// Produce one finished module, walking the tiers in order.
    pub async fn compile(&self, job: &RenderJob) -> Result<CompiledModule, Error> {
        let mut last_error = String::new();

        if let Some(bridge) = &self.bridge {
            match bridge.render(job).await {
                Ok(html) => return Ok(self.finish(job, html, RenderTier::Bridge)),
                Err(e) => {
                    warn!(module = %job.module.title, error = %e, "bridge tier failed");
                    last_error = e.to_string();
                }
            }
        }

        if self.backend.is_configured() {
            match render_generative(self.backend.as_ref(), job).await {
                Ok(html) => return Ok(self.finish(job, html, RenderTier::Generative)),
                Err(e) => {
                    warn!(module = %job.module.title, error = %e, "generative tier failed");
                    last_error = e.to_string();
                }
            }
        } else if last_error.is_empty() {
            last_error = "no generative backend configured".into();
        }

        if self.require_generative_html {
            return Err(RenderError::GenerativeRequired(last_error).into());
        }
        Ok(self.finish(job, render_template(job), RenderTier::Template))
    }

    fn finish(&self, job: &RenderJob, html: String, tier: RenderTier) -> CompiledModule {
        info!(module = %job.module.title, slug = %job.module_slug, %tier, "module compiled");
        CompiledModule {
            slug: job.module_slug.clone(),
            order: job.module_index + 1,
            title: job.module.title.clone(),
            html,
            generated_by: tier,
            generated_at: Utc::now(),
        }
    }
}
