//! Footnote numbering
//!
//! Runs after all annotations are rendered so marks follow processing order
//! within each annotated resource.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::annotate::RenderResult;
use crate::dom::Document;

pub const ATTR_FOOTNOTE_MARK: &str = "data-footnote-mark";

/// How footnote marks are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootnoteMarks {
    /// `*`, `**`, `***`, ...
    #[default]
    Asterisks,
    /// `1`, `2`, `3`, ...
    Numeric,
}

impl FootnoteMarks {
    /// Mark for the footnote at a zero-based position
    pub fn mark(&self, index: usize) -> String {
        match self {
            FootnoteMarks::Asterisks => "*".repeat(index + 1),
            FootnoteMarks::Numeric => (index + 1).to_string(),
        }
    }
}

impl fmt::Display for FootnoteMarks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FootnoteMarks::Asterisks => f.write_str("asterisks"),
            FootnoteMarks::Numeric => f.write_str("numeric"),
        }
    }
}

impl FromStr for FootnoteMarks {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asterisks" | "asterisk" | "*" => Ok(FootnoteMarks::Asterisks),
            "numeric" | "numbers" | "1" => Ok(FootnoteMarks::Numeric),
            other => Err(format!("unknown footnote mark style: {}", other)),
        }
    }
}

/// Prefix each footnote with its mark
///
/// Marks restart for every annotated resource, so the first footnote on each
/// `data-node-id` gets the first mark. Returns the number of footnotes
/// marked. Results without a footnote are skipped and do not consume a mark.
pub fn number_footnotes(doc: &mut Document, results: &[RenderResult], marks: FootnoteMarks) -> usize {
    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut count = 0;

    for result in results {
        let Some(footnote) = result.footnote else {
            continue;
        };
        let position = counters.entry(result.target_node_id.as_str()).or_insert(0);
        let mark = marks.mark(*position);
        *position += 1;

        doc.set_attr(footnote, ATTR_FOOTNOTE_MARK, &mark);

        let sup = doc.create_element("sup", &[("class", "footnote-mark")]);
        let text = doc.create_text(&mark);
        doc.append_child(sup, text);
        doc.prepend_child(footnote, sup);

        count += 1;
    }

    count
}
