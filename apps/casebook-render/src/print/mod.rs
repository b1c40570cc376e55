//! Print layout
//!
//! Places the rendered content into the output container, either:
//! - paginated: laid out by a [`PaginationEngine`] into page wrappers
//! - flat: cloned as-is, with the page selector wired up
//!
//! Either way the container is marked ready (`data-ready="true"`) once the
//! layout is complete, which is what headless exporters wait for.

mod paginator;

use std::fmt;

pub use paginator::{FlowPaginator, Page, PaginationEngine, PaginationError};

use crate::annotations::PageManifest;
use crate::config::RenderConfig;
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::render::{number_footnotes, FootnoteMarks, RenderResult};

pub const ATTR_READY: &str = "data-ready";
pub const ATTR_PAGE_COUNT: &str = "data-page-count";
pub const ATTR_PAGE_NUMBER: &str = "data-page-number";
pub const PAGE_CLASS: &str = "pagedjs_page";

/// Navigates to the chosen page when the selector changes
const PAGE_SELECTOR_ONCHANGE: &str = "window.location.href = this.value";

/// How the output is laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutMode {
    Paginated { stylesheet: String },
    Flat,
}

impl LayoutMode {
    /// Resolve the mode from the page flags
    ///
    /// Pagination without a stylesheet falls back to flat.
    pub fn resolve(use_pagination: bool, stylesheet: Option<&str>) -> Self {
        if !use_pagination {
            return LayoutMode::Flat;
        }
        match stylesheet.map(str::trim).filter(|s| !s.is_empty()) {
            Some(stylesheet) => LayoutMode::Paginated {
                stylesheet: stylesheet.to_string(),
            },
            None => {
                tracing::warn!("Pagination requested without a stylesheet, using flat layout");
                LayoutMode::Flat
            }
        }
    }

    pub fn from_manifest(manifest: &PageManifest) -> Self {
        Self::resolve(manifest.use_pagination, manifest.stylesheet.as_deref())
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self, LayoutMode::Paginated { .. })
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::Paginated { stylesheet } => write!(f, "paginated ({})", stylesheet),
            LayoutMode::Flat => f.write_str("flat"),
        }
    }
}

/// Result of a layout run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOutcome {
    pub mode: LayoutMode,
    /// Pages produced; `None` for flat layout
    pub page_count: Option<usize>,
    /// Footnotes numbered before layout
    pub footnotes: usize,
}

/// Lays out rendered content into the output container
pub struct PrintLayoutDriver<E> {
    engine: E,
    page_selector_class: String,
    footnote_marks: FootnoteMarks,
}

impl<E: PaginationEngine> PrintLayoutDriver<E> {
    pub fn new(engine: E, config: &RenderConfig) -> Self {
        Self {
            engine,
            page_selector_class: config.page_selector_class.clone(),
            footnote_marks: config.footnote_marks,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Number footnotes, then lay out `content` into `output`
    ///
    /// A pagination failure is returned and leaves the container unmarked.
    pub async fn run(
        &self,
        doc: &mut Document,
        content: NodeId,
        output: NodeId,
        mode: LayoutMode,
        results: &[RenderResult],
    ) -> Result<LayoutOutcome> {
        let footnotes = number_footnotes(doc, results, self.footnote_marks);

        let page_count = match &mode {
            LayoutMode::Paginated { stylesheet } => {
                let pages = self.engine.paginate(doc, content, stylesheet).await?;
                place_pages(doc, output, &pages, stylesheet);
                tracing::info!("Paginated layout ready: {} page(s)", pages.len());
                Some(pages.len())
            }
            LayoutMode::Flat => {
                render_flat(doc, content, output, &self.page_selector_class);
                None
            }
        };

        Ok(LayoutOutcome {
            mode,
            page_count,
            footnotes,
        })
    }
}

fn place_pages(doc: &mut Document, output: NodeId, pages: &[Page], stylesheet: &str) {
    for (i, page) in pages.iter().enumerate() {
        let number = (i + 1).to_string();
        let wrapper = doc.create_element(
            "div",
            &[("class", PAGE_CLASS), (ATTR_PAGE_NUMBER, number.as_str())],
        );
        for &node in &page.nodes {
            let copy = doc.deep_clone(node);
            doc.append_child(wrapper, copy);
        }
        doc.append_child(output, wrapper);
    }

    doc.set_attr(output, "data-stylesheet", stylesheet);
    doc.set_attr(output, ATTR_PAGE_COUNT, &pages.len().to_string());
    doc.set_attr(output, ATTR_READY, "true");
}

/// Copy the content into the output container unpaginated
///
/// Synchronous: the container is marked ready before this returns.
pub fn render_flat(doc: &mut Document, content: NodeId, output: NodeId, page_selector_class: &str) {
    let copy = doc.deep_clone(content);
    doc.append_child(output, copy);

    let selectors = doc.find_elements(doc.root(), |doc, n| {
        doc.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case("select"))
            && doc.has_class(n, page_selector_class)
    });
    for select in &selectors {
        doc.set_attr(*select, "onchange", PAGE_SELECTOR_ONCHANGE);
    }

    doc.set_attr(output, ATTR_READY, "true");
    tracing::info!("Flat layout ready ({} page selector(s))", selectors.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{Annotation, AnnotationKind};
    use crate::mapper::{map_all, NodeIndex};
    use crate::render::render_all;
    use async_trait::async_trait;

    const PAGE: &str = r#"<html><body>
<select class="page-selector"><option value="/p/1">1</option></select>
<div id="print-source"><p data-node-id="a">first paragraph</p><p data-node-id="b">second</p></div>
<div id="print-output"></div>
</body></html>"#;

    struct FailingEngine;

    #[async_trait]
    impl PaginationEngine for FailingEngine {
        async fn paginate(
            &self,
            _doc: &Document,
            _content: NodeId,
            _stylesheet: &str,
        ) -> std::result::Result<Vec<Page>, PaginationError> {
            Err(PaginationError::Engine("renderer crashed".to_string()))
        }
    }

    fn setup() -> (Document, NodeId, NodeId) {
        let doc = Document::parse(PAGE).unwrap();
        let content = doc.find_by_id("print-source").unwrap();
        let output = doc.find_by_id("print-output").unwrap();
        (doc, content, output)
    }

    fn driver<E: PaginationEngine>(engine: E) -> PrintLayoutDriver<E> {
        PrintLayoutDriver::new(engine, &RenderConfig::default())
    }

    #[test]
    fn test_resolve_mode() {
        assert_eq!(LayoutMode::resolve(false, Some("print.css")), LayoutMode::Flat);
        assert_eq!(LayoutMode::resolve(true, None), LayoutMode::Flat);
        assert_eq!(LayoutMode::resolve(true, Some(" ")), LayoutMode::Flat);
        assert_eq!(
            LayoutMode::resolve(true, Some("print.css")),
            LayoutMode::Paginated {
                stylesheet: "print.css".to_string()
            }
        );
    }

    #[test]
    fn test_flat_output_is_structural_clone() {
        let (mut doc, content, output) = setup();

        render_flat(&mut doc, content, output, "page-selector");

        let children = doc.children(output).to_vec();
        assert_eq!(children.len(), 1);
        assert!(doc.structurally_equal(content, &doc, children[0]));
        assert_ne!(children[0], content);
        assert_eq!(doc.attr(output, ATTR_READY), Some("true"));

        let select = doc.find_by_tag("select").unwrap();
        assert_eq!(doc.attr(select, "onchange"), Some(PAGE_SELECTOR_ONCHANGE));
    }

    #[tokio::test]
    async fn test_run_flat() {
        let (mut doc, content, output) = setup();

        let outcome = driver(FlowPaginator::default())
            .run(&mut doc, content, output, LayoutMode::Flat, &[])
            .await
            .unwrap();

        assert_eq!(outcome.mode, LayoutMode::Flat);
        assert_eq!(outcome.page_count, None);
        assert_eq!(doc.attr(output, ATTR_READY), Some("true"));
    }

    #[tokio::test]
    async fn test_run_paginated() {
        let (mut doc, content, output) = setup();
        let mode = LayoutMode::Paginated {
            stylesheet: "print.css".to_string(),
        };

        let outcome = driver(FlowPaginator::new(10))
            .run(&mut doc, content, output, mode, &[])
            .await
            .unwrap();

        assert_eq!(outcome.page_count, Some(2));
        let pages = doc.children(output).to_vec();
        assert_eq!(pages.len(), 2);
        assert!(doc.has_class(pages[0], PAGE_CLASS));
        assert_eq!(doc.attr(pages[1], ATTR_PAGE_NUMBER), Some("2"));
        assert_eq!(doc.text_content(pages[1]), "second");
        assert_eq!(doc.attr(output, ATTR_PAGE_COUNT), Some("2"));
        assert_eq!(doc.attr(output, "data-stylesheet"), Some("print.css"));
        assert_eq!(doc.attr(output, ATTR_READY), Some("true"));
        // source content is left in place
        assert_eq!(doc.children(content).len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_failure_leaves_container_unready() {
        let (mut doc, content, output) = setup();
        let mode = LayoutMode::Paginated {
            stylesheet: "print.css".to_string(),
        };

        let result = driver(FailingEngine)
            .run(&mut doc, content, output, mode, &[])
            .await;

        assert!(matches!(
            result,
            Err(crate::error::RenderError::Pagination(PaginationError::Engine(_)))
        ));
        assert_eq!(doc.attr(output, ATTR_READY), None);
        assert!(doc.children(output).is_empty());
    }

    #[tokio::test]
    async fn test_run_numbers_footnotes_before_layout() {
        let (mut doc, content, output) = setup();
        let index = NodeIndex::build(&doc, content);
        let annotations = vec![
            Annotation::new("1", AnnotationKind::Note, "a", 0, 5).with_content("n1"),
            Annotation::new("2", AnnotationKind::Note, "b", 0, 6).with_content("n2"),
        ];
        let report = map_all(&doc, &index, &annotations);
        let results = render_all(&mut doc, &report.mapped);

        let outcome = driver(FlowPaginator::default())
            .run(&mut doc, content, output, LayoutMode::Flat, &results)
            .await
            .unwrap();

        assert_eq!(outcome.footnotes, 2);
        let cloned_marks = doc.find_elements(output, |doc, n| doc.has_class(n, "footnote-mark"));
        let marks: Vec<String> = cloned_marks.iter().map(|m| doc.text_content(*m)).collect();
        // separate resources, so each starts over
        assert_eq!(marks, vec!["*", "*"]);
    }
}
