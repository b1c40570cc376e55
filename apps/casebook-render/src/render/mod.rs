//! Annotation rendering
//!
//! Applies mapped annotations to the content tree:
//! - Per-kind markup (highlight, elide, note, replace, correction, link)
//! - Footnotes for notes and links, numbered after rendering
//! - New-tab targets and URL footnotes for external links in the content

mod annotate;
mod footnotes;
mod links;

pub(crate) use annotate::wrap_range;
pub use annotate::{footnote_text, render_all, render_annotation, RenderResult, ELISION_MARK};
pub use footnotes::{number_footnotes, FootnoteMarks, ATTR_FOOTNOTE_MARK};
pub use links::{is_external_url, rewrite_external_links, LinkReport};
