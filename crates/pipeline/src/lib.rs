//! End-to-end generation pipeline for PlayForge.
//!
//! One [`Pipeline::generate`] call walks the whole flow: source inputs →
//! context → scope estimate → blueprint → module compilation and knowledge
//! synthesis (concurrent) → artifact writes → think-tank merge → catalog
//! record. Progress is emitted at stage boundaries and cancellation is
//! checked between stages, never mid-call.

pub mod artifacts;

use std::path::PathBuf;
use std::sync::Arc;

use playforge_backends::backend_from_config;
use playforge_blueprint::synthesize_blueprint;
use playforge_capability::{CapabilityRegistry, bootstrap_registry};
use playforge_compiler::{BridgeRenderer, ModuleCompiler, RenderJob};
use playforge_config::AppConfig;
use playforge_context::{
    DEFAULT_TERM_LIMIT, build_context, estimate_module_count, extract_grounding_terms,
};
pub use playforge_context::SourceInputs;
use playforge_core::error::{Error, InputError};
use playforge_core::text::{slugify, text_or};
use playforge_core::{
    Blueprint, CancelSignal, CompiledModule, GenerativeBackend, KnowledgePack, LocalPack,
    ModuleManifest, ProgressEvent, ProgressSink, Step,
};
use playforge_knowledge::{distribute, synthesize_knowledge};
use playforge_store::{GenerationCatalog, GenerationRecord, MergeReport, ThinkTankStore};
use chrono::Utc;
use tracing::info;

/// Everything a caller gets back from one finished run.
#[derive(Debug)]
pub struct GenerationOutcome {
    pub book_id: String,
    pub title: String,
    /// Directory the module artifacts live under.
    pub artifact_dir: PathBuf,
    pub modules: Vec<ModuleManifest>,
    pub pack: KnowledgePack,
    pub merge: MergeReport,
}

pub struct Pipeline {
    backend: Arc<dyn GenerativeBackend>,
    registry: CapabilityRegistry,
    compiler: ModuleCompiler,
    store: ThinkTankStore,
    catalog: GenerationCatalog,
    artifact_root: PathBuf,
    search_limit: usize,
    max_file_bytes: usize,
}

impl Pipeline {
    /// Wire the standard pipeline from configuration: the configured
    /// backend chain, the bootstrap capability registry, and the stores
    /// under `storage`.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let backend: Arc<dyn GenerativeBackend> = Arc::new(backend_from_config(config));
        Self::with_backend(config, backend)
    }

    /// Same wiring with a caller-supplied backend, for embedding and tests.
    pub fn with_backend(
        config: &AppConfig,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Result<Self, Error> {
        let bridge = if config.bridge.is_configured() {
            config
                .bridge
                .url
                .clone()
                .map(|url| BridgeRenderer::new(url, config.bridge.timeout_secs))
        } else {
            None
        };
        let compiler =
            ModuleCompiler::new(backend.clone(), bridge, config.require_generative_html);
        Ok(Self {
            backend,
            registry: bootstrap_registry(config),
            compiler,
            store: ThinkTankStore::open(&config.storage.think_tank_path)?,
            catalog: GenerationCatalog::open(&config.storage.catalog_path)?,
            artifact_root: config.storage.artifact_root.clone(),
            search_limit: config.network.search_result_limit,
            max_file_bytes: config.network.max_file_bytes,
        })
    }

    pub fn store(&self) -> &ThinkTankStore {
        &self.store
    }

    pub fn catalog(&self) -> &GenerationCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Run the whole pipeline for one set of inputs.
    pub async fn generate(
        &self,
        inputs: &SourceInputs,
        progress: &dyn ProgressSink,
        cancel: &CancelSignal,
    ) -> Result<GenerationOutcome, Error> {
        cancel.check("prepare-sources")?;
        progress.emit(ProgressEvent::new(Step::PrepareSources, 4, "validating source inputs"));
        if inputs.is_empty() {
            return Err(InputError::EmptyContext.into());
        }

        cancel.check("build-context")?;
        progress.emit(ProgressEvent::new(Step::BuildContext, 12, "gathering source material"));
        let context =
            build_context(inputs, &self.registry, self.search_limit, self.max_file_bytes).await?;
        info!(
            title = %context.title,
            chars = context.char_len(),
            sources = context.sources.len(),
            "context assembled"
        );

        cancel.check("design")?;
        let terms = extract_grounding_terms(&context.text, DEFAULT_TERM_LIMIT);
        let module_count = estimate_module_count(&context);
        progress.emit(ProgressEvent::new(
            Step::Design,
            24,
            format!("scoped to {module_count} module(s)"),
        ));

        cancel.check("blueprint")?;
        progress.emit(ProgressEvent::new(Step::Blueprint, 32, "synthesizing scenario blueprint"));
        let blueprint =
            synthesize_blueprint(self.backend.as_ref(), &context, &terms, module_count).await?;

        cancel.check("modules")?;
        let book_id = book_id_for(&blueprint, &context.title);
        let slugs = module_slugs(&book_id, &blueprint);
        progress.emit(ProgressEvent::new(
            Step::Modules,
            44,
            format!("compiling {} module(s)", blueprint.modules.len()),
        ));

        let jobs: Vec<RenderJob> = (0..blueprint.modules.len())
            .map(|i| RenderJob::from_blueprint(&blueprint, &book_id, i, &slugs, &context.text, &terms))
            .collect();

        // Module rendering and knowledge synthesis share only the
        // read-only context, so they run side by side.
        let modules_future = async {
            let mut compiled = Vec::with_capacity(jobs.len());
            for job in &jobs {
                compiled.push(self.compiler.compile(job).await?);
            }
            Ok::<Vec<CompiledModule>, Error>(compiled)
        };
        let knowledge_future =
            synthesize_knowledge(self.backend.as_ref(), &context, &terms, module_count);
        let (compiled, pack) = tokio::join!(modules_future, knowledge_future);
        let compiled = compiled?;
        progress.emit(ProgressEvent::new(
            Step::Knowledge,
            68,
            format!(
                "knowledge pack ready: {} skills, {} entries, {} questions",
                pack.skills.len(),
                pack.entries.len(),
                pack.questions.len()
            ),
        ));

        cancel.check("persist")?;
        progress.emit(ProgressEvent::new(Step::Persist, 78, "writing experience artifacts"));
        let book_dir = self.artifact_root.join(&book_id);
        if let Err(e) = artifacts::write_modules(&book_dir, &compiled).await {
            artifacts::remove_book_dir(&book_dir).await;
            return Err(e);
        }

        // The store merge must not run for a cancelled run, and a run
        // cancelled here must not leave artifacts behind.
        if let Err(e) = cancel.check("merge") {
            artifacts::remove_book_dir(&book_dir).await;
            return Err(e);
        }
        let module_titles: Vec<String> =
            blueprint.modules.iter().map(|m| m.title.clone()).collect();
        let local_packs: Vec<(String, LocalPack)> =
            slugs.iter().cloned().zip(distribute(&pack, &module_titles)).collect();
        let title = text_or(&blueprint.book_title, &context.title).to_string();
        let merge = self.store.merge(&book_id, &title, &pack.summary, &local_packs).await?;

        self.catalog
            .record(GenerationRecord {
                book_id: book_id.clone(),
                title: title.clone(),
                summary: pack.summary.clone(),
                module_count: compiled.len(),
                modules: compiled.iter().map(CompiledModule::manifest).collect(),
                skill_count: pack.skills.len(),
                entry_count: pack.entries.len(),
                question_count: pack.questions.len(),
                artifact_dir: book_dir.clone(),
                generated_at: Utc::now(),
            })
            .await?;

        progress.emit(ProgressEvent::new(Step::Done, 100, "experience ready"));
        info!(%book_id, modules = compiled.len(), entries = merge.total_entries, "generation finished");

        Ok(GenerationOutcome {
            book_id,
            title,
            artifact_dir: book_dir,
            modules: compiled.iter().map(CompiledModule::manifest).collect(),
            pack,
            merge,
        })
    }
}

/// Stable id for the experience; regenerating the same title overwrites
/// the previous run.
fn book_id_for(blueprint: &Blueprint, context_title: &str) -> String {
    let slug = slugify(text_or(&blueprint.book_title, context_title));
    if slug.is_empty() { "experience".to_string() } else { slug }
}

/// Globally unique module slugs: book id, 1-based order, slugged title.
fn module_slugs(book_id: &str, blueprint: &Blueprint) -> Vec<String> {
    blueprint
        .modules
        .iter()
        .enumerate()
        .map(|(i, module)| {
            let title_slug = slugify(&module.title);
            if title_slug.is_empty() {
                format!("{book_id}-module-{}", i + 1)
            } else {
                format!("{book_id}-{}-{title_slug}", i + 1)
            }
        })
        .collect()
}
