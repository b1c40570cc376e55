//! Annotation records
//!
//! An annotation is an author-created mark on a resource's text, addressed by
//! the `data-node-id` of the content node it belongs to and a half-open
//! `[start_offset, end_offset)` char interval into that node's text.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique identifier
    pub id: String,
    /// Kind of annotation
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    /// `data-node-id` of the annotated content node
    pub target_node_id: String,
    /// Start char offset (inclusive)
    pub start_offset: usize,
    /// End char offset (exclusive)
    pub end_offset: usize,
    /// Creation timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Note text, replacement text or link URL depending on the kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Kinds of annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    /// Highlighted span
    Highlight,
    /// Elided (hidden) span
    Elide,
    /// Span with an attached note
    Note,
    /// Span replaced by authored text
    Replace,
    /// Span corrected by authored text
    Correction,
    /// Span linked to a URL
    Link,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Elide => "elide",
            AnnotationKind::Note => "note",
            AnnotationKind::Replace => "replace",
            AnnotationKind::Correction => "correction",
            AnnotationKind::Link => "link",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown annotation type string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown annotation type: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for AnnotationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highlight" => Ok(AnnotationKind::Highlight),
            "elide" => Ok(AnnotationKind::Elide),
            "note" => Ok(AnnotationKind::Note),
            "replace" => Ok(AnnotationKind::Replace),
            "correction" => Ok(AnnotationKind::Correction),
            "link" => Ok(AnnotationKind::Link),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

impl Annotation {
    /// Create an annotation with no timestamp or content
    pub fn new(
        id: &str,
        kind: AnnotationKind,
        target_node_id: &str,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            target_node_id: target_node_id.to_string(),
            start_offset,
            end_offset,
            created_at: None,
            content: None,
        }
    }

    /// Set the content payload
    pub fn with_content(mut self, content: &str) -> Self {
        self.content = Some(content.to_string());
        self
    }

    /// Set the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Content payload, empty when absent
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Sort annotations into document order: by start offset, then id
///
/// This is the order the content store hands annotations out in. The
/// renderer never reorders its input, so callers that want document order
/// sort first.
pub fn sort_document_order(annotations: &mut [Annotation]) {
    annotations.sort_by(|a, b| {
        a.start_offset
            .cmp(&b.start_offset)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Parse a timestamp leniently
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` (with a space or `T`) and bare
/// dates. Values without an offset are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Human-readable date used in footnotes, e.g. `Jan 15, 2023`
pub fn format_display_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

/// Machine-readable timestamp for `datetime` attributes
pub fn format_datetime_attr(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
