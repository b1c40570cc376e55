//! Print settings
//!
//! One immutable record for the reader-facing print options (font, margins,
//! TOC depth and which annotation kinds are visible), turned into CSS for the
//! rendered page.

use serde::{Deserialize, Serialize};

/// Deepest TOC level that carries a `data-toc-depth` marker
pub const MAX_TOC_DEPTH: u8 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    pub font_face: String,
    pub font_size_pt: f32,
    pub margin_in: f32,
    /// TOC entries deeper than this are hidden
    pub toc_depth: u8,
    pub show_highlights: bool,
    /// Show elided text struck through instead of the `…` marker
    pub show_elided_text: bool,
    /// Show replacement text instead of the original
    pub show_replacements: bool,
    pub show_notes: bool,
    pub show_link_footnotes: bool,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            font_face: "Times New Roman".to_string(),
            font_size_pt: 12.0,
            margin_in: 1.0,
            toc_depth: 3,
            show_highlights: true,
            show_elided_text: false,
            show_replacements: true,
            show_notes: true,
            show_link_footnotes: true,
        }
    }
}

impl PrintSettings {
    /// CSS applying these settings to rendered content
    pub fn to_css(&self) -> String {
        let mut rules = vec![
            format!(
                "body {{ font-family: \"{}\"; font-size: {}pt; }}",
                self.font_face.replace('"', "'"),
                self.font_size_pt
            ),
            format!("@page {{ margin: {}in; }}", self.margin_in),
        ];

        for depth in self.toc_depth.saturating_add(1)..=MAX_TOC_DEPTH {
            rules.push(format!("[data-toc-depth=\"{}\"] {{ display: none; }}", depth));
        }

        if !self.show_highlights {
            rules.push(
                ".annotate.highlighted, span.layered { background: none; border-bottom: none; }"
                    .to_string(),
            );
        }

        rules.push(if self.show_elided_text {
            ".annotate.elision { display: none; }".to_string()
        } else {
            ".annotate.elided { display: none; }".to_string()
        });

        rules.push(if self.show_replacements {
            ".annotate.replaced { display: none; }".to_string()
        } else {
            ".annotate.replacement { display: none; }".to_string()
        });

        // corrections always read as corrected
        rules.push(".annotate.corrected { display: none; }".to_string());

        if !self.show_notes {
            rules.push(".annotate.note-content { display: none; }".to_string());
        }

        if !self.show_link_footnotes {
            rules.push(".annotate.link-footnote, .link-footnote { display: none; }".to_string());
        }

        rules.join("\n")
    }
}
