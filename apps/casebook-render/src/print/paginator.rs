//! Pagination engines
//!
//! The driver hands the mutated content tree to an engine and gets back the
//! nodes that belong on each page. `FlowPaginator` is the built-in engine; a
//! headless-browser engine can be plugged in through the same trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::dom::{Document, NodeId};

/// Pagination failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("No stylesheet given for paginated layout")]
    MissingStylesheet,

    #[error("Content root is not an element")]
    InvalidContent,

    #[error("Pagination engine failed: {0}")]
    Engine(String),
}

/// One page of laid-out content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Top-level content nodes placed on this page, in order
    pub nodes: Vec<NodeId>,
}

/// Splits content into pages
#[async_trait]
pub trait PaginationEngine: Send + Sync {
    /// Lay out the children of `content` using the named stylesheet
    async fn paginate(
        &self,
        doc: &Document,
        content: NodeId,
        stylesheet: &str,
    ) -> Result<Vec<Page>, PaginationError>;
}

/// Greedy text-length paginator
///
/// Packs the content root's children onto pages until adding the next child
/// would exceed `chars_per_page`. A child longer than a page gets a page of
/// its own; children are never split.
#[derive(Debug, Clone)]
pub struct FlowPaginator {
    pub chars_per_page: usize,
}

impl FlowPaginator {
    pub fn new(chars_per_page: usize) -> Self {
        Self {
            chars_per_page: chars_per_page.max(1),
        }
    }

    fn weight(doc: &Document, node: NodeId) -> usize {
        doc.text_content(node).trim().chars().count()
    }
}

impl Default for FlowPaginator {
    fn default() -> Self {
        Self::new(3000)
    }
}

#[async_trait]
impl PaginationEngine for FlowPaginator {
    async fn paginate(
        &self,
        doc: &Document,
        content: NodeId,
        stylesheet: &str,
    ) -> Result<Vec<Page>, PaginationError> {
        if stylesheet.trim().is_empty() {
            return Err(PaginationError::MissingStylesheet);
        }
        if !doc.is_element(content) {
            return Err(PaginationError::InvalidContent);
        }

        let mut pages = Vec::new();
        let mut current = Page::default();
        let mut used = 0;

        for &child in doc.children(content) {
            let weight = Self::weight(doc, child);
            if !current.nodes.is_empty() && used + weight > self.chars_per_page {
                pages.push(std::mem::take(&mut current));
                used = 0;
            }
            current.nodes.push(child);
            used += weight;
        }

        if !current.nodes.is_empty() || pages.is_empty() {
            pages.push(current);
        }

        tracing::debug!(
            "Paginated {} node(s) into {} page(s) with {}",
            doc.children(content).len(),
            pages.len(),
            stylesheet
        );

        Ok(pages)
    }
}
