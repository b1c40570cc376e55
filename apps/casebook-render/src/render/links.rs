//! External link handling for printed content
//!
//! Links already in the content (not created from annotations) open in a new
//! tab and get a printed footnote with their URL, since the href is lost on
//! paper.

use chrono::{DateTime, Utc};

use super::annotate::footnote_text;
use crate::dom::{Document, NodeId};

/// What [`rewrite_external_links`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// External links found under the root
    pub external: usize,
    /// Links that had `target`/`rel` added
    pub retargeted: usize,
    /// Footnotes inserted, in document order
    pub footnotes: Vec<NodeId>,
}

/// Whether an href points off-site
pub fn is_external_url(href: &str) -> bool {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || href.starts_with("//")
}

/// Open external links in a new tab and footnote their URLs
///
/// Anchors carrying `data-type` were produced by the annotation renderer and
/// already have a footnote, so they are left alone. `date` is shown next to
/// the URL, usually the section timestamp.
pub fn rewrite_external_links(
    doc: &mut Document,
    root: NodeId,
    date: Option<&DateTime<Utc>>,
) -> LinkReport {
    let mut report = LinkReport::default();

    let anchors = doc.find_elements(root, |doc, n| {
        doc.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case("a"))
            && doc.attr(n, "href").is_some_and(is_external_url)
    });

    for anchor in anchors {
        report.external += 1;

        if doc.attr(anchor, "target").is_none() {
            doc.set_attr(anchor, "target", "_blank");
            if doc.attr(anchor, "rel").is_none() {
                doc.set_attr(anchor, "rel", "noopener noreferrer");
            }
            report.retargeted += 1;
        }

        if doc.attr(anchor, "data-type").is_some() {
            continue;
        }

        let href = doc.attr(anchor, "href").unwrap_or_default().trim().to_string();
        let footnote = doc.create_element("span", &[("class", "link-footnote")]);
        let text = doc.create_text(&footnote_text(&href, date));
        doc.append_child(footnote, text);
        doc.insert_after(anchor, footnote);
        report.footnotes.push(footnote);
    }

    if report.external > 0 {
        tracing::debug!(
            "Rewrote {} external link(s), {} footnoted",
            report.external,
            report.footnotes.len()
        );
    }

    report
}
