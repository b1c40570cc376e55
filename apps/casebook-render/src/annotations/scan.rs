//! Page scan
//!
//! A single streaming pass over the page HTML that collects everything the
//! render needs besides the content tree itself:
//! - annotation elements (`[data-annotation-type]`) and their payloads
//! - the pagination flag (`data-use-pagedjs`) and stylesheet (`data-stylesheet`)
//! - the section timestamp used to date auto-footnoted links
//!
//! Uses lol_html so the annotation list is read without building a tree.

use std::cell::RefCell;

use chrono::{DateTime, Utc};
use lol_html::{element, rewrite_str, text, RewriteStrSettings};

use super::types::{parse_datetime, Annotation, AnnotationKind};
use crate::error::AnnotationError;

pub const ATTR_NODE_ID: &str = "data-node-id";
pub const ATTR_START_OFFSET: &str = "data-start-offset";
pub const ATTR_END_OFFSET: &str = "data-end-offset";
pub const ATTR_ANNOTATION_ID: &str = "data-annotation-id";
pub const ATTR_ANNOTATION_TYPE: &str = "data-annotation-type";
pub const ATTR_DATETIME: &str = "data-datetime";
pub const ATTR_USE_PAGEDJS: &str = "data-use-pagedjs";
pub const ATTR_STYLESHEET: &str = "data-stylesheet";
pub const ATTR_SECTION_TIMESTAMP: &str = "data-timestamp";

/// Errors from the page scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("HTML rewrite failed: {0}")]
    RewriteError(String),
}

/// Everything read from the page besides the content tree
#[derive(Debug, Default)]
pub struct PageManifest {
    /// Annotations in page order
    pub annotations: Vec<Annotation>,
    /// Annotation elements that could not be turned into annotations
    pub malformed: Vec<AnnotationError>,
    /// Whether paginated preview was requested
    pub use_pagination: bool,
    /// Stylesheet for paginated mode
    pub stylesheet: Option<String>,
    /// Top-level section timestamp
    pub section_timestamp: Option<DateTime<Utc>>,
}

/// Attributes of one annotation element, as found
#[derive(Debug, Default)]
struct RawAnnotation {
    id: Option<String>,
    kind: Option<String>,
    node_id: Option<String>,
    start: Option<String>,
    end: Option<String>,
    datetime: Option<String>,
    content: String,
}

#[derive(Debug, Default)]
struct ScanState {
    raw: Vec<RawAnnotation>,
    use_pagination: Option<bool>,
    stylesheet: Option<String>,
    section_timestamp: Option<String>,
}

/// Scan a page for annotation records and render flags
pub fn scan_page(html: &str) -> Result<PageManifest, ScanError> {
    let state = RefCell::new(ScanState::default());

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("[data-annotation-type]", |el| {
                    let attr = |name: &str| el.get_attribute(name).map(|v| decode(&v));
                    state.borrow_mut().raw.push(RawAnnotation {
                        id: attr(ATTR_ANNOTATION_ID),
                        kind: attr(ATTR_ANNOTATION_TYPE),
                        node_id: attr(ATTR_NODE_ID),
                        start: attr(ATTR_START_OFFSET),
                        end: attr(ATTR_END_OFFSET),
                        datetime: attr(ATTR_DATETIME),
                        content: String::new(),
                    });
                    Ok(())
                }),
                // Annotation elements never nest, so text always belongs to the last one
                text!("[data-annotation-type]", |chunk| {
                    if let Some(last) = state.borrow_mut().raw.last_mut() {
                        last.content.push_str(chunk.as_str());
                    }
                    Ok(())
                }),
                element!("[data-use-pagedjs]", |el| {
                    let mut state = state.borrow_mut();
                    if state.use_pagination.is_none() {
                        let value = el.get_attribute(ATTR_USE_PAGEDJS).unwrap_or_default();
                        state.use_pagination = Some(parse_flag(&value));
                    }
                    Ok(())
                }),
                element!("[data-stylesheet]", |el| {
                    let mut state = state.borrow_mut();
                    if state.stylesheet.is_none() {
                        state.stylesheet = el
                            .get_attribute(ATTR_STYLESHEET)
                            .map(|v| decode(&v))
                            .filter(|v| !v.trim().is_empty());
                    }
                    Ok(())
                }),
                element!("section[data-timestamp]", |el| {
                    let mut state = state.borrow_mut();
                    if state.section_timestamp.is_none() {
                        state.section_timestamp = el.get_attribute(ATTR_SECTION_TIMESTAMP);
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ScanError::RewriteError(e.to_string()))?;

    let state = state.into_inner();
    let mut manifest = PageManifest {
        use_pagination: state.use_pagination.unwrap_or(false),
        stylesheet: state.stylesheet,
        section_timestamp: state.section_timestamp.as_deref().and_then(parse_datetime),
        ..PageManifest::default()
    };

    for raw in state.raw {
        match build_annotation(raw) {
            Ok(annotation) => manifest.annotations.push(annotation),
            Err(e) => {
                tracing::warn!("Skipping annotation element: {}", e);
                manifest.malformed.push(e);
            }
        }
    }

    tracing::debug!(
        "Scanned page: {} annotations, {} malformed, pagination={}",
        manifest.annotations.len(),
        manifest.malformed.len(),
        manifest.use_pagination
    );

    Ok(manifest)
}

fn build_annotation(raw: RawAnnotation) -> Result<Annotation, AnnotationError> {
    let malformed = |reason: String| AnnotationError::Malformed {
        annotation_id: raw.id.clone(),
        reason,
    };

    let id = raw
        .id
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| malformed(format!("missing {}", ATTR_ANNOTATION_ID)))?;
    let kind: AnnotationKind = raw
        .kind
        .as_deref()
        .ok_or_else(|| malformed(format!("missing {}", ATTR_ANNOTATION_TYPE)))?
        .parse()
        .map_err(|e: super::types::UnknownKind| malformed(e.to_string()))?;
    let target_node_id = raw
        .node_id
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| malformed(format!("missing {}", ATTR_NODE_ID)))?;
    let start_offset = parse_offset(raw.start.as_deref(), ATTR_START_OFFSET).map_err(malformed)?;
    let end_offset = parse_offset(raw.end.as_deref(), ATTR_END_OFFSET).map_err(malformed)?;

    if start_offset > end_offset {
        return Err(malformed(format!(
            "start offset {} is after end offset {}",
            start_offset, end_offset
        )));
    }

    let created_at = raw.datetime.as_deref().and_then(parse_datetime);
    let content = decode(raw.content.trim());

    Ok(Annotation {
        id,
        kind,
        target_node_id,
        start_offset,
        end_offset,
        created_at,
        content: if content.is_empty() { None } else { Some(content) },
    })
}

/// Offsets of `-1` mark annotations whose text was deleted by an edit
fn parse_offset(raw: Option<&str>, name: &str) -> Result<usize, String> {
    let raw = raw.ok_or_else(|| format!("missing {}", name))?;
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid {}: {:?}", name, raw))?;
    if value < 0 {
        return Err(format!("{} is negative ({}), annotation was invalidated", name, value));
    }
    Ok(value as usize)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "true" | "1" | "yes"
    )
}

fn decode(value: &str) -> String {
    html_escape::decode_html_entities(value).into_owned()
}
