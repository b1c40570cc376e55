//! Range mapping
//!
//! Converts stored character-offset annotations into spans over the text
//! nodes of the content tree. An annotation whose interval crosses text node
//! boundaries (inline markup, paragraph breaks) decomposes into one
//! [`TextRange`] per text node, in document order.
//!
//! Mapping is read-only: every annotation is mapped against the tree as it
//! was before any rendering, and the renderer resolves the ranges through
//! later text splits (see [`Document::resolve_position`]).

use std::collections::HashMap;

use crate::annotations::{Annotation, ATTR_NODE_ID};
use crate::dom::{Document, NodeId};
use crate::error::AnnotationError;

/// A half-open char span inside one text node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(node: NodeId, start: usize, end: usize) -> Self {
        Self { node, start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Zero-width ranges mark insertion points
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Lookup of annotatable content nodes by `data-node-id`
#[derive(Debug, Default)]
pub struct NodeIndex {
    nodes: HashMap<String, NodeId>,
}

impl NodeIndex {
    /// Index every `data-node-id` element at or below `root`
    ///
    /// When an id repeats, the first element in document order wins.
    pub fn build(doc: &Document, root: NodeId) -> Self {
        let mut nodes = HashMap::new();
        let candidates = std::iter::once(root).chain(doc.descendants(root));
        for node in candidates {
            if let Some(id) = doc.attr(node, ATTR_NODE_ID) {
                nodes.entry(id.to_string()).or_insert(node);
            }
        }
        Self { nodes }
    }

    pub fn get(&self, node_id: &str) -> Option<NodeId> {
        self.nodes.get(node_id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Ranges for one annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub ranges: Vec<TextRange>,
    /// Set when the offsets ran past the end of the target's text and were clamped
    pub clamped: Option<AnnotationError>,
}

/// An annotation paired with its ranges
#[derive(Debug, Clone)]
pub struct MappedAnnotation<'a> {
    pub annotation: &'a Annotation,
    pub ranges: Vec<TextRange>,
}

/// Result of mapping a batch of annotations
#[derive(Debug, Default)]
pub struct MappingReport<'a> {
    /// Mapped annotations, in input order
    pub mapped: Vec<MappedAnnotation<'a>>,
    /// Skipped annotations and clamped offsets
    pub issues: Vec<AnnotationError>,
}

/// Map one annotation onto the text nodes of its target
///
/// Offsets past the end of the target's text are clamped to its length and
/// reported through [`Mapping::clamped`].
pub fn map_annotation(
    doc: &Document,
    index: &NodeIndex,
    annotation: &Annotation,
) -> Result<Mapping, AnnotationError> {
    let target = index.get(&annotation.target_node_id).ok_or_else(|| {
        AnnotationError::TargetNotFound {
            annotation_id: annotation.id.clone(),
            node_id: annotation.target_node_id.clone(),
        }
    })?;

    if annotation.start_offset > annotation.end_offset {
        return Err(AnnotationError::Malformed {
            annotation_id: Some(annotation.id.clone()),
            reason: format!(
                "start offset {} is after end offset {}",
                annotation.start_offset, annotation.end_offset
            ),
        });
    }

    let leaves = doc.text_leaves(target);
    if leaves.is_empty() {
        return Err(AnnotationError::EmptyTarget {
            annotation_id: annotation.id.clone(),
            node_id: annotation.target_node_id.clone(),
        });
    }

    let length: usize = leaves.iter().map(|leaf| doc.text_len(*leaf)).sum();
    let mut start = annotation.start_offset;
    let mut end = annotation.end_offset;
    let mut clamped = None;

    if end > length {
        let issue = AnnotationError::OffsetOutOfRange {
            annotation_id: annotation.id.clone(),
            start,
            end,
            length,
        };
        tracing::warn!("{}", issue);
        clamped = Some(issue);
        end = length;
        start = start.min(end);
    }

    Ok(Mapping {
        ranges: map_leaves(doc, &leaves, start, end),
        clamped,
    })
}

/// Walk text leaves in document order and cut `[start, end)` into ranges
///
/// Expects `start <= end <= total length`. Stops at the leaf holding `end`.
fn map_leaves(doc: &Document, leaves: &[NodeId], start: usize, end: usize) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    let mut current = 0;

    for &leaf in leaves {
        let len = doc.text_len(leaf);
        let leaf_end = current + len;

        if ranges.is_empty() {
            if leaf_end <= start {
                current = leaf_end;
                continue;
            }
            let local_start = start - current;
            if end <= leaf_end {
                ranges.push(TextRange::new(leaf, local_start, end - current));
                return ranges;
            }
            ranges.push(TextRange::new(leaf, local_start, len));
        } else {
            if len == 0 {
                continue;
            }
            if end <= leaf_end {
                ranges.push(TextRange::new(leaf, 0, end - current));
                return ranges;
            }
            ranges.push(TextRange::new(leaf, 0, len));
        }

        current = leaf_end;
    }

    // Only an insertion point at the very end of the text gets here
    if ranges.is_empty() {
        if let Some(&last) = leaves.last() {
            let len = doc.text_len(last);
            ranges.push(TextRange::new(last, len, len));
        }
    }

    ranges
}

/// Map every annotation independently, keeping input order
pub fn map_all<'a>(
    doc: &Document,
    index: &NodeIndex,
    annotations: &'a [Annotation],
) -> MappingReport<'a> {
    let mut report = MappingReport::default();

    for annotation in annotations {
        match map_annotation(doc, index, annotation) {
            Ok(mapping) => {
                tracing::debug!(
                    "Mapped {} annotation {} to {} range(s)",
                    annotation.kind,
                    annotation.id,
                    mapping.ranges.len()
                );
                if let Some(issue) = mapping.clamped {
                    report.issues.push(issue);
                }
                report.mapped.push(MappedAnnotation {
                    annotation,
                    ranges: mapping.ranges,
                });
            }
            Err(e) => {
                tracing::warn!("Skipping annotation: {}", e);
                report.issues.push(e);
            }
        }
    }

    report
}

/// Map a raw `[start, end)` interval over the text below `target`
///
/// Offsets are clamped to the text length. Returns no ranges when the target
/// has no text or `start > end`.
pub fn map_range(doc: &Document, target: NodeId, start: usize, end: usize) -> Vec<TextRange> {
    let leaves = doc.text_leaves(target);
    let length: usize = leaves.iter().map(|leaf| doc.text_len(*leaf)).sum();
    if leaves.is_empty() || start > end {
        return Vec::new();
    }
    let end = end.min(length);
    map_leaves(doc, &leaves, start.min(end), end)
}

/// Text covered by the ranges, concatenated in order
pub fn extract_text(doc: &Document, ranges: &[TextRange]) -> String {
    ranges
        .iter()
        .filter_map(|range| {
            doc.text(range.node).map(|text| {
                text.chars()
                    .skip(range.start)
                    .take(range.end - range.start)
                    .collect::<String>()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationKind;

    fn setup(body: &str) -> (Document, NodeIndex) {
        let doc = Document::parse(body).unwrap();
        let index = NodeIndex::build(&doc, doc.root());
        (doc, index)
    }

    fn annotation(kind: AnnotationKind, start: usize, end: usize) -> Annotation {
        Annotation::new("a1", kind, "n1", start, end)
    }

    #[test]
    fn test_single_leaf_range() {
        let (doc, index) = setup(r#"<div data-node-id="n1">Hello world, this is a test.</div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Highlight, 6, 11)).unwrap();

        assert_eq!(mapping.ranges.len(), 1);
        assert_eq!(mapping.ranges[0].start, 6);
        assert_eq!(mapping.ranges[0].end, 11);
        assert_eq!(extract_text(&doc, &mapping.ranges), "world");
        assert!(mapping.clamped.is_none());
    }

    #[test]
    fn test_range_split_across_two_leaves() {
        let (doc, index) = setup(r#"<div data-node-id="n1">Hello <em>world</em></div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Note, 3, 9)).unwrap();

        assert_eq!(mapping.ranges.len(), 2);
        assert_eq!((mapping.ranges[0].start, mapping.ranges[0].end), (3, 6));
        assert_eq!((mapping.ranges[1].start, mapping.ranges[1].end), (0, 3));
        assert_eq!(doc.text(mapping.ranges[0].node), Some("Hello "));
        assert_eq!(doc.text(mapping.ranges[1].node), Some("world"));
        assert_eq!(extract_text(&doc, &mapping.ranges), "lo wor");
    }

    #[test]
    fn test_range_across_block_elements() {
        let (doc, index) =
            setup(r#"<div data-node-id="n1"><p>First para.</p><p>Second <b>bold</b> end</p></div>"#);

        // "First para.Second bold end"
        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Elide, 6, 22)).unwrap();

        assert_eq!(mapping.ranges.len(), 3);
        assert_eq!(extract_text(&doc, &mapping.ranges), "para.Second bold");
    }

    #[test]
    fn test_stops_at_closing_leaf() {
        let (doc, index) = setup(r#"<div data-node-id="n1"><p>ab</p><p>cd</p><p>ef</p></div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Highlight, 1, 4)).unwrap();

        assert_eq!(mapping.ranges.len(), 2);
        assert_eq!(extract_text(&doc, &mapping.ranges), "bcd");
    }

    #[test]
    fn test_concatenation_matches_substring_for_all_intervals() {
        let (doc, index) =
            setup(r#"<div data-node-id="n1"><p>One <i>two</i></p><p>three</p> four</div>"#);
        let target = index.get("n1").unwrap();
        let text: Vec<char> = doc.text_content(target).chars().collect();

        for start in 0..=text.len() {
            for end in start..=text.len() {
                let mapping =
                    map_annotation(&doc, &index, &annotation(AnnotationKind::Highlight, start, end))
                        .unwrap();
                let expected: String = text[start..end].iter().collect();
                assert_eq!(extract_text(&doc, &mapping.ranges), expected, "[{}, {})", start, end);
                assert!(!mapping.ranges.is_empty());
            }
        }
    }

    #[test]
    fn test_zero_width_inside_leaf() {
        let (doc, index) = setup(r#"<div data-node-id="n1">CLICK here</div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Note, 5, 5)).unwrap();

        assert_eq!(mapping.ranges.len(), 1);
        assert!(mapping.ranges[0].is_empty());
        assert_eq!(mapping.ranges[0].start, 5);
    }

    #[test]
    fn test_zero_width_on_leaf_boundary_opens_in_next_leaf() {
        let (doc, index) = setup(r#"<div data-node-id="n1">Hello <em>world</em></div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Link, 6, 6)).unwrap();

        assert_eq!(mapping.ranges.len(), 1);
        assert_eq!(doc.text(mapping.ranges[0].node), Some("world"));
        assert_eq!(mapping.ranges[0].start, 0);
    }

    #[test]
    fn test_zero_width_at_end_of_text() {
        let (doc, index) = setup(r#"<div data-node-id="n1">Hello <em>world</em></div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Note, 11, 11)).unwrap();

        assert_eq!(mapping.ranges.len(), 1);
        assert_eq!(doc.text(mapping.ranges[0].node), Some("world"));
        assert_eq!((mapping.ranges[0].start, mapping.ranges[0].end), (5, 5));
    }

    #[test]
    fn test_end_past_text_is_clamped() {
        let (doc, index) = setup(r#"<div data-node-id="n1">Hello <em>world</em></div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Highlight, 6, 40)).unwrap();

        assert_eq!(extract_text(&doc, &mapping.ranges), "world");
        assert_eq!(
            mapping.clamped,
            Some(AnnotationError::OffsetOutOfRange {
                annotation_id: "a1".to_string(),
                start: 6,
                end: 40,
                length: 11,
            })
        );
    }

    #[test]
    fn test_start_past_text_clamps_to_end_insertion_point() {
        let (doc, index) = setup(r#"<div data-node-id="n1">Hello</div>"#);

        let mapping =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Highlight, 8, 12)).unwrap();

        assert_eq!(mapping.ranges.len(), 1);
        assert!(mapping.ranges[0].is_empty());
        assert_eq!(mapping.ranges[0].start, 5);
        assert!(mapping.clamped.is_some());
    }

    #[test]
    fn test_target_not_found() {
        let (doc, index) = setup(r#"<div data-node-id="n1">Hello</div>"#);
        let missing = Annotation::new("a9", AnnotationKind::Highlight, "nope", 0, 2);

        let err = map_annotation(&doc, &index, &missing).unwrap_err();

        assert_eq!(
            err,
            AnnotationError::TargetNotFound {
                annotation_id: "a9".to_string(),
                node_id: "nope".to_string(),
            }
        );
    }

    #[test]
    fn test_target_without_text() {
        let (doc, index) = setup(r#"<div data-node-id="n1"><img src="x.png"></div>"#);

        let err =
            map_annotation(&doc, &index, &annotation(AnnotationKind::Highlight, 0, 0)).unwrap_err();

        assert!(matches!(err, AnnotationError::EmptyTarget { .. }));
    }

    #[test]
    fn test_map_all_skips_bad_and_keeps_order() {
        let (doc, index) = setup(
            r#"<div data-node-id="n1">Hello world</div><div data-node-id="n2">Second</div>"#,
        );
        let annotations = vec![
            Annotation::new("3", AnnotationKind::Highlight, "n2", 0, 3),
            Annotation::new("1", AnnotationKind::Highlight, "missing", 0, 3),
            Annotation::new("2", AnnotationKind::Elide, "n1", 0, 99),
            Annotation::new("0", AnnotationKind::Note, "n1", 0, 5),
        ];

        let report = map_all(&doc, &index, &annotations);

        let ids: Vec<&str> = report.mapped.iter().map(|m| m.annotation.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "0"]);
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues[0].is_skipped());
        assert!(!report.issues[1].is_skipped());
    }

    #[test]
    fn test_index_ignores_nodes_outside_root() {
        let doc = Document::parse(
            r#"<div id="content"><div data-node-id="n1">x</div></div><span data-node-id="n2">y</span>"#,
        )
        .unwrap();
        let content = doc.find_by_id("content").unwrap();

        let index = NodeIndex::build(&doc, content);

        assert_eq!(index.len(), 1);
        assert!(index.get("n1").is_some());
        assert!(index.get("n2").is_none());
    }

    #[test]
    fn test_map_range_clamps() {
        let (doc, index) = setup(r#"<p data-node-id="n1">Hello <b>world</b></p>"#);
        let target = index.get("n1").unwrap();

        let ranges = map_range(&doc, target, 4, 40);

        assert_eq!(ranges.len(), 2);
        assert_eq!(extract_text(&doc, &ranges), "o world");
        assert!(map_range(&doc, target, 5, 2).is_empty());
    }
}
