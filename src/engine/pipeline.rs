use std::path::Path;

use crate::dom::parser::parse_html;
use crate::dom::PageTree;
use crate::error::SiteError;
use crate::render::layout::compute_layout;

/// A parsed and laid-out page, ready to paint
pub struct Page {
    pub tree: PageTree,
    pub stats: PageStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageStats {
    pub total_nodes: usize,
    /// Elements carrying the breakable marker
    pub breakable_nodes: usize,
    /// `id`s of every `<section>`, in document order
    pub section_ids: Vec<String>,
    pub page_height: f32,
}

/// The page pipeline: Read → Parse → Layout
pub struct PageEngine {
    viewport_width: f32,
    breakable_marker: String,
}

impl PageEngine {
    pub fn new(viewport_width: f32) -> Self {
        Self {
            viewport_width,
            breakable_marker: "data-breakable".into(),
        }
    }

    /// Attribute counted as the breakable marker in [`PageStats`].
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.breakable_marker = marker.into();
        self
    }

    /// Load an HTML file through the full pipeline
    pub fn load_page(&self, path: impl AsRef<Path>) -> Result<Page, SiteError> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path)?;
        log::info!("Loaded page {} ({} bytes)", path.display(), html.len());
        Ok(self.process_html(&html))
    }

    /// Process raw HTML through the pipeline
    pub fn process_html(&self, html: &str) -> Page {
        // Phase 1: Parse
        let mut tree = parse_html(html);

        // Phase 2: Layout
        let page_height = compute_layout(&mut tree, self.viewport_width);

        let stats = PageStats {
            total_nodes: tree.node_count(),
            breakable_nodes: tree.select_by_attr(&self.breakable_marker).len(),
            section_ids: section_ids(&tree),
            page_height,
        };
        log::debug!(
            "Pipeline: {} nodes, {} breakable, {} sections, {:.0}px tall",
            stats.total_nodes,
            stats.breakable_nodes,
            stats.section_ids.len(),
            stats.page_height
        );

        Page { tree, stats }
    }

    /// Re-run layout after a window resize. Scroll is kept in range.
    pub fn relayout(&self, page: &mut Page) {
        page.stats.page_height = compute_layout(&mut page.tree, self.viewport_width);
        let viewport = &mut page.tree.viewport;
        viewport.scroll_by(0.0, page.stats.page_height);
    }

    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
    }
}

fn section_ids(tree: &PageTree) -> Vec<String> {
    tree.descendants(tree.root())
        .into_iter()
        .filter_map(|id| tree.get(id))
        .filter(|n| n.tag == "section")
        .filter_map(|n| n.attr("id").map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<html><head><title>Jane Doe</title></head><body>
        <section id="home"><h1><span data-breakable>Jane Doe</span></h1></section>
        <section id="about"><p><span data-breakable>Graduate</span> student</p></section>
        </body></html>"#;

    #[test]
    fn pipeline_parses_and_lays_out() {
        let page = PageEngine::new(1024.0).process_html(HTML);
        assert_eq!(page.tree.title, "Jane Doe");
        assert_eq!(page.stats.breakable_nodes, 2);
        assert_eq!(page.stats.section_ids, vec!["home", "about"]);
        assert!(page.stats.page_height > 0.0);
        assert_eq!(page.tree.page_height, page.stats.page_height);
    }

    #[test]
    fn custom_marker_is_counted() {
        let page = PageEngine::new(1024.0)
            .with_marker("data-missing")
            .process_html(HTML);
        assert_eq!(page.stats.breakable_nodes, 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PageEngine::new(800.0)
            .load_page("/definitely/not/here.html")
            .err()
            .unwrap();
        assert!(matches!(err, SiteError::Io(_)));
    }

    #[test]
    fn bundled_site_page() {
        let page = PageEngine::new(1280.0).process_html(include_str!("../../site/index.html"));
        assert_eq!(
            page.stats.section_ids,
            vec!["home", "about", "skills", "projects", "certifications"]
        );
        assert_eq!(page.stats.breakable_nodes, 17);
        assert_eq!(page.tree.select_by_attr("data-word-repair").len(), 1);
    }

    #[test]
    fn relayout_follows_width() {
        let mut engine = PageEngine::new(1200.0);
        let mut page = engine.process_html(HTML);
        engine.set_viewport_width(320.0);
        engine.relayout(&mut page);
        assert_eq!(page.tree.viewport.width, 320.0);
    }
}
