//! Highlight layers and span composition
//!
//! A layer groups related highlights under one color. Each composed span
//! carries the ordered set of layers active over it, so colors and selectors
//! come straight from the data instead of from rendered class names.

use serde::{Deserialize, Serialize};

use super::color::Rgb;

/// A named highlight layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub color: Rgb,
}

impl Layer {
    pub fn new(id: &str, color: Rgb) -> Self {
        Self {
            id: id.to_string(),
            color,
        }
    }
}

/// Insertion-ordered set of layer ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LayerSet {
    ids: Vec<String>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer; returns false if it was already present
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Space-separated ids, as written to `data-layers`
    pub fn attr_value(&self) -> String {
        self.ids.join(" ")
    }
}

impl<'a> FromIterator<&'a str> for LayerSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = LayerSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

/// One highlight on a layer, as a char interval of the target's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerHighlight {
    pub layer: String,
    pub start: usize,
    pub end: usize,
}

impl LayerHighlight {
    pub fn new(layer: &str, start: usize, end: usize) -> Self {
        Self {
            layer: layer.to_string(),
            start,
            end,
        }
    }
}

/// A maximal run of text with a constant set of active layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpan {
    pub start: usize,
    pub end: usize,
    pub layers: LayerSet,
}

/// Compose overlapping highlights into non-overlapping spans
///
/// Layers are listed in each span in the order they first appear in
/// `highlights`. Adjacent runs with the same layers are merged; text no
/// highlight covers produces no span. Empty highlights are ignored.
pub fn compose_spans(highlights: &[LayerHighlight]) -> Vec<LayerSpan> {
    let highlights: Vec<&LayerHighlight> = highlights.iter().filter(|h| h.start < h.end).collect();
    let discovery: LayerSet = highlights.iter().map(|h| h.layer.as_str()).collect();

    let mut bounds: Vec<usize> = highlights.iter().flat_map(|h| [h.start, h.end]).collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut spans: Vec<LayerSpan> = Vec::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        let layers: LayerSet = discovery
            .iter()
            .filter(|layer| {
                highlights
                    .iter()
                    .any(|h| h.layer == *layer && h.start <= start && h.end >= end)
            })
            .collect();
        if layers.is_empty() {
            continue;
        }

        match spans.last_mut() {
            Some(last) if last.end == start && last.layers == layers => last.end = end,
            _ => spans.push(LayerSpan { start, end, layers }),
        }
    }

    spans
}
