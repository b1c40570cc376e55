//! Error types for casebook rendering

use thiserror::Error;

use crate::annotations::ScanError;
use crate::dom::DomError;
use crate::print::PaginationError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, RenderError>;

/// Failures that stop a render
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Page scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Content root not found: #{0}")]
    ContentRootMissing(String),

    #[error("Output container not found: #{0}")]
    OutputContainerMissing(String),

    #[error("Pagination failed: {0}")]
    Pagination(#[from] PaginationError),
}

/// Problems with a single annotation
///
/// None of these abort a render. `OffsetOutOfRange` is reported after the
/// offsets were clamped and the annotation rendered; every other variant means
/// the annotation was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Annotation {annotation_id}: target node {node_id} not found")]
    TargetNotFound {
        annotation_id: String,
        node_id: String,
    },

    #[error(
        "Annotation {annotation_id}: offsets {start}-{end} exceed text length {length}, clamped"
    )]
    OffsetOutOfRange {
        annotation_id: String,
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("Annotation {annotation_id}: target node {node_id} has no text")]
    EmptyTarget {
        annotation_id: String,
        node_id: String,
    },

    #[error("Malformed annotation {}: {reason}", .annotation_id.as_deref().unwrap_or("<unknown>"))]
    Malformed {
        annotation_id: Option<String>,
        reason: String,
    },
}

impl AnnotationError {
    /// Id of the annotation this problem belongs to, when known
    pub fn annotation_id(&self) -> Option<&str> {
        match self {
            AnnotationError::TargetNotFound { annotation_id, .. }
            | AnnotationError::OffsetOutOfRange { annotation_id, .. }
            | AnnotationError::EmptyTarget { annotation_id, .. } => Some(annotation_id),
            AnnotationError::Malformed { annotation_id, .. } => annotation_id.as_deref(),
        }
    }

    /// Whether the annotation was left out of the render
    pub fn is_skipped(&self) -> bool {
        !matches!(self, AnnotationError::OffsetOutOfRange { .. })
    }
}
