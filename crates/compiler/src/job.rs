//! Input bundle for rendering one module.

use playforge_core::blueprint::{Blueprint, ModulePlan};

/// Everything a renderer tier needs to produce one module's HTML.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub book_id: String,
    pub book_title: String,
    pub module: ModulePlan,
    /// 0-based position.
    pub module_index: usize,
    pub module_count: usize,
    pub module_slug: String,
    pub next_slug: Option<String>,
    pub prev_slug: Option<String>,
    /// Experience-level framing carried into every module.
    pub opening: String,
    pub objective: String,
    pub intel: Vec<String>,
    pub debrief: String,
    /// Aggregated source text for grounding prompts.
    pub context_text: String,
    pub terms: Vec<String>,
}

impl RenderJob {
    pub fn from_blueprint(
        blueprint: &Blueprint,
        book_id: &str,
        module_index: usize,
        slugs: &[String],
        context_text: &str,
        terms: &[String],
    ) -> Self {
        let module = blueprint.modules[module_index].clone();
        Self {
            book_id: book_id.to_string(),
            book_title: blueprint.book_title.clone(),
            module,
            module_index,
            module_count: blueprint.modules.len(),
            module_slug: slugs[module_index].clone(),
            next_slug: slugs.get(module_index + 1).cloned(),
            prev_slug: module_index.checked_sub(1).and_then(|i| slugs.get(i)).cloned(),
            opening: blueprint.opening_narrative.clone(),
            objective: blueprint.learning_objective.clone(),
            intel: blueprint.background_intel.clone(),
            debrief: blueprint.debrief.clone(),
            context_text: context_text.to_string(),
            terms: terms.to_vec(),
        }
    }

    pub fn next_href(&self) -> String {
        match &self.next_slug {
            Some(slug) => format!("/experiences/{slug}.html"),
            None => format!("/books/{}.html", self.book_id),
        }
    }

    pub fn prev_href(&self) -> String {
        match &self.prev_slug {
            Some(slug) => format!("/experiences/{slug}.html"),
            None => format!("/books/{}.html", self.book_id),
        }
    }

    pub fn hub_href(&self) -> String {
        format!("/books/{}.html", self.book_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrefs_fall_back_to_the_hub() {
        let blueprint = Blueprint {
            book_title: "T".into(),
            modules: vec![ModulePlan::default()],
            ..Default::default()
        };
        let job = RenderJob::from_blueprint(&blueprint, "b-1", 0, &["m-1".into()], "", &[]);
        assert_eq!(job.next_href(), "/books/b-1.html");
        assert_eq!(job.prev_href(), "/books/b-1.html");
        assert_eq!(job.hub_href(), "/books/b-1.html");
    }

    #[test]
    fn middle_module_links_both_neighbours() {
        let blueprint = Blueprint {
            book_title: "T".into(),
            modules: vec![ModulePlan::default(); 3],
            ..Default::default()
        };
        let slugs: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let job = RenderJob::from_blueprint(&blueprint, "b-1", 1, &slugs, "", &[]);
        assert_eq!(job.next_href(), "/experiences/c.html");
        assert_eq!(job.prev_href(), "/experiences/a.html");
    }
}
