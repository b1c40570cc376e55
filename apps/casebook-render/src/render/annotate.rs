//! Annotation markup
//!
//! Turns an annotation and its ranges into in-place DOM mutations. Ranges are
//! resolved through text-node splits made by earlier annotations, so
//! overlapping annotations nest or sit side by side in processing order.

use crate::annotations::{
    format_datetime_attr, format_display_date, Annotation, AnnotationKind, ATTR_ANNOTATION_ID,
};
use crate::dom::{Document, NodeId};
use crate::mapper::{MappedAnnotation, TextRange};

/// Text of the combined elision indicator
pub const ELISION_MARK: &str = "\u{2026}";

/// Elements created for one annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    pub annotation_id: String,
    pub kind: AnnotationKind,
    /// `data-node-id` of the annotated resource
    pub target_node_id: String,
    /// Every element created, in creation order
    pub elements: Vec<NodeId>,
    /// Note or link footnote, if one was inserted
    pub footnote: Option<NodeId>,
}

impl RenderResult {
    fn new(annotation: &Annotation) -> Self {
        Self {
            annotation_id: annotation.id.clone(),
            kind: annotation.kind,
            target_node_id: annotation.target_node_id.clone(),
            elements: Vec::new(),
            footnote: None,
        }
    }

    fn push(&mut self, element: NodeId) {
        self.elements.push(element);
    }

    fn set_footnote(&mut self, footnote: NodeId) {
        self.elements.push(footnote);
        self.footnote = Some(footnote);
    }
}

/// Render every mapped annotation, in input order
pub fn render_all(doc: &mut Document, mapped: &[MappedAnnotation<'_>]) -> Vec<RenderResult> {
    mapped
        .iter()
        .map(|m| render_annotation(doc, m.annotation, &m.ranges))
        .collect()
}

/// Render one annotation over its ranges
pub fn render_annotation(
    doc: &mut Document,
    annotation: &Annotation,
    ranges: &[TextRange],
) -> RenderResult {
    let mut result = RenderResult::new(annotation);
    let datetime = annotation.created_at.as_ref().map(format_datetime_attr);
    let datetime_attrs: Vec<(&str, &str)> = datetime
        .as_deref()
        .map(|d| vec![("datetime", d)])
        .unwrap_or_default();

    match annotation.kind {
        AnnotationKind::Highlight => {
            for range in ranges {
                for wrapper in wrap_range(doc, *range, |doc| {
                    marker(doc, "span", "annotate highlighted", annotation, &[])
                }) {
                    result.push(wrapper);
                }
            }
        }

        AnnotationKind::Elide => {
            let mut last = None;
            for range in ranges {
                for wrapper in wrap_range(doc, *range, |doc| {
                    marker(doc, "del", "annotate elided", annotation, &datetime_attrs)
                }) {
                    result.push(wrapper);
                    last = Some(wrapper);
                }
            }
            if let Some(last) = last {
                let indicator = marker(doc, "span", "annotate elision", annotation, &[]);
                let mark = doc.create_text(ELISION_MARK);
                doc.append_child(indicator, mark);
                doc.insert_after(last, indicator);
                result.push(indicator);
            }
        }

        AnnotationKind::Note => {
            let mut last = None;
            for range in ranges {
                for wrapper in wrap_range(doc, *range, |doc| {
                    marker(
                        doc,
                        "span",
                        "annotate note-highlight",
                        annotation,
                        &[("tabindex", "0")],
                    )
                }) {
                    result.push(wrapper);
                    last = Some(wrapper);
                }
            }
            if let Some(last) = last {
                let footnote = marker(doc, "aside", "annotate note-content", annotation, &[]);
                let text = doc.create_text(annotation.content_str());
                doc.append_child(footnote, text);
                doc.insert_after(last, footnote);
                result.set_footnote(footnote);
            }
        }

        AnnotationKind::Replace | AnnotationKind::Correction => {
            let (deleted_class, inserted_class) = if annotation.kind == AnnotationKind::Replace {
                ("annotate replaced", "annotate replacement")
            } else {
                ("annotate corrected", "annotate correction")
            };
            for range in ranges {
                let wrappers = wrap_range(doc, *range, |doc| {
                    marker(doc, "del", deleted_class, annotation, &datetime_attrs)
                });
                let Some(&last) = wrappers.last() else {
                    continue;
                };
                result.elements.extend(wrappers);

                let inserted = marker(doc, "ins", inserted_class, annotation, &datetime_attrs);
                let text = doc.create_text(annotation.content_str());
                doc.append_child(inserted, text);
                doc.insert_after(last, inserted);
                result.push(inserted);
            }
        }

        AnnotationKind::Link => {
            let url = annotation.content_str().trim().to_string();
            let mut last = None;
            for range in ranges {
                for anchor in wrap_range(doc, *range, |doc| {
                    marker(
                        doc,
                        "a",
                        "annotate link",
                        annotation,
                        &[
                            ("href", url.as_str()),
                            ("target", "_blank"),
                            ("rel", "noopener noreferrer"),
                            ("data-type", "annotation"),
                        ],
                    )
                }) {
                    result.push(anchor);
                    last = Some(anchor);
                }
            }
            match last {
                Some(last) if !url.is_empty() => {
                    let text = footnote_text(&url, annotation.created_at.as_ref());
                    let footnote = marker(doc, "span", "annotate link-footnote", annotation, &[]);
                    let text = doc.create_text(&text);
                    doc.append_child(footnote, text);
                    doc.insert_after(last, footnote);
                    result.set_footnote(footnote);
                }
                Some(_) => {
                    tracing::warn!("Link annotation {} has no URL", annotation.id);
                }
                None => {}
            }
        }
    }

    tracing::debug!(
        "Rendered {} annotation {}: {} element(s)",
        annotation.kind,
        annotation.id,
        result.elements.len()
    );

    result
}

/// Footnote text for a link: the URL, followed by the date when known
pub fn footnote_text(url: &str, date: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    match date {
        Some(date) => format!("{} ({})", url, format_display_date(date)),
        None => url.to_string(),
    }
}

fn marker(
    doc: &mut Document,
    tag: &str,
    class: &str,
    annotation: &Annotation,
    extra: &[(&str, &str)],
) -> NodeId {
    let el = doc.create_element(
        tag,
        &[("class", class), (ATTR_ANNOTATION_ID, annotation.id.as_str())],
    );
    for (name, value) in extra {
        doc.set_attr(el, name, value);
    }
    el
}

/// Wrap the text a range covers, one wrapper per text node it now spans
///
/// Zero-width ranges get an empty wrapper at the insertion point.
pub(crate) fn wrap_range<F>(doc: &mut Document, range: TextRange, mut make: F) -> Vec<NodeId>
where
    F: FnMut(&mut Document) -> NodeId,
{
    resolve_pieces(doc, range)
        .into_iter()
        .map(|piece| {
            let wrapper = make(doc);
            if piece.is_empty() {
                insert_at(doc, piece, wrapper);
            } else {
                wrap_piece(doc, piece, wrapper);
            }
            wrapper
        })
        .collect()
}

/// Resolve a range computed against unsplit text into per-node pieces
fn resolve_pieces(doc: &Document, range: TextRange) -> Vec<TextRange> {
    let (start_node, start) = doc.resolve_position(range.node, range.start, true);
    if range.is_empty() {
        return vec![TextRange::new(start_node, start, start)];
    }
    let (end_node, end) = doc.resolve_position(range.node, range.end, false);

    let mut pieces = Vec::new();
    let mut node = start_node;
    let mut from = start;
    loop {
        if node == end_node {
            if end > from {
                pieces.push(TextRange::new(node, from, end));
            }
            break;
        }
        let len = doc.text_len(node);
        if len > from {
            pieces.push(TextRange::new(node, from, len));
        }
        match doc.continuation(node) {
            Some(next) => {
                node = next;
                from = 0;
            }
            None => break,
        }
    }
    pieces
}

fn wrap_piece(doc: &mut Document, piece: TextRange, wrapper: NodeId) {
    let len = doc.text_len(piece.node);
    let mut target = piece.node;
    if piece.start > 0 {
        if let Some(right) = doc.split_text(piece.node, piece.start) {
            target = right;
        }
    }
    if piece.end < len {
        doc.split_text(target, piece.end - piece.start);
    }
    doc.wrap(target, wrapper);
}

fn insert_at(doc: &mut Document, point: TextRange, element: NodeId) {
    let len = doc.text_len(point.node);
    if point.start == 0 {
        doc.insert_before(point.node, element);
    } else if point.start >= len {
        doc.insert_after(point.node, element);
    } else if let Some(right) = doc.split_text(point.node, point.start) {
        doc.insert_before(right, element);
    }
}
