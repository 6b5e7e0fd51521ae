//! Module artifact layout: `<artifact_root>/<book_id>/<module_slug>/`
//! holding `code.html` and a `module.json` manifest.

use std::path::Path;

use playforge_core::CompiledModule;
use playforge_core::error::{Error, StoreError};
use tracing::{debug, warn};

/// Write every compiled module under `book_dir`. The caller removes the
/// directory if a later stage aborts the run.
pub async fn write_modules(book_dir: &Path, modules: &[CompiledModule]) -> Result<(), Error> {
    for module in modules {
        let dir = book_dir.join(&module.slug);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", dir.display())))?;

        let html_path = dir.join("code.html");
        tokio::fs::write(&html_path, &module.html)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", html_path.display())))?;

        let manifest = serde_json::to_string_pretty(&module.manifest())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let manifest_path = dir.join("module.json");
        tokio::fs::write(&manifest_path, manifest)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", manifest_path.display())))?;

        debug!(slug = %module.slug, tier = %module.generated_by, "module artifact written");
    }
    Ok(())
}

/// Best-effort removal of a run's artifact directory after an abort.
pub async fn remove_book_dir(book_dir: &Path) {
    match tokio::fs::remove_dir_all(book_dir).await {
        Ok(()) => debug!(dir = %book_dir.display(), "partial artifacts removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(dir = %book_dir.display(), error = %e, "failed to remove partial artifacts"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playforge_core::RenderTier;

    fn module(slug: &str) -> CompiledModule {
        CompiledModule {
            slug: slug.into(),
            order: 1,
            title: "The Levy".into(),
            html: "<!doctype html><html><body><script></script></body></html>".into(),
            generated_by: RenderTier::Template,
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn writes_html_and_manifest_per_module() {
        let dir = tempfile::tempdir().unwrap();
        let book_dir = dir.path().join("book-1");
        write_modules(&book_dir, &[module("book-1-1-levy")]).await.unwrap();

        let html =
            std::fs::read_to_string(book_dir.join("book-1-1-levy").join("code.html")).unwrap();
        assert!(html.contains("<body"));

        let manifest: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(book_dir.join("book-1-1-levy").join("module.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["slug"], "book-1-1-levy");
        assert_eq!(manifest["generated_by"], "template");
        assert!(manifest.get("html").is_none());
    }

    #[tokio::test]
    async fn removal_is_quiet_when_nothing_was_written() {
        let dir = tempfile::tempdir().unwrap();
        remove_book_dir(&dir.path().join("never-created")).await;

        let book_dir = dir.path().join("book-2");
        write_modules(&book_dir, &[module("book-2-1-x")]).await.unwrap();
        remove_book_dir(&book_dir).await;
        assert!(!book_dir.exists());
    }
}
