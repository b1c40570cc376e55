//! Layered highlight overlay
//!
//! Colors text covered by several highlight layers at once:
//! - [`compose_spans`] turns per-layer highlights into spans with explicit layer sets
//! - [`OverlayContext::blend`] computes the color for a layer set
//! - [`OverlayContext::layer_rules`] emits one CSS rule per distinct combination
//!
//! All state lives in an [`OverlayContext`] built per render.

mod color;
mod layers;
mod settings;

use std::fmt;

pub use color::{ColorError, Rgb};
pub use layers::{compose_spans, Layer, LayerHighlight, LayerSet, LayerSpan};
pub use settings::{PrintSettings, MAX_TOC_DEPTH};

use crate::dom::{Document, NodeId};
use crate::mapper::map_range;
use crate::render::wrap_range;

/// Total opacity shared by the layers active on a span
pub const LAYER_OPACITY: f64 = 0.6;

pub const ATTR_LAYERS: &str = "data-layers";

/// A single CSS rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<(String, String)>,
}

impl fmt::Display for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.selector)?;
        for (property, value) in &self.declarations {
            write!(f, " {}: {};", property, value)?;
        }
        f.write_str(" }")
    }
}

/// Per-render overlay state
#[derive(Debug, Clone, Default)]
pub struct OverlayContext {
    pub settings: PrintSettings,
    layers: Vec<Layer>,
}

impl OverlayContext {
    pub fn new(settings: PrintSettings, layers: Vec<Layer>) -> Self {
        Self { settings, layers }
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Color for a span covered by the given layers
    ///
    /// Starts from white and composites each layer in set order with an
    /// opacity of `0.6 / n`, where `n` counts every layer in the set. Unknown
    /// layers contribute no color.
    pub fn blend(&self, set: &LayerSet) -> Rgb {
        let known: Vec<&Layer> = set.iter().filter_map(|id| self.layer(id)).collect();
        if known.len() < set.len() {
            tracing::warn!("Unknown layer in set {:?}", set.attr_value());
        }
        if known.is_empty() {
            return Rgb::WHITE;
        }

        let alpha = LAYER_OPACITY / set.len() as f64;
        known
            .iter()
            .fold(Rgb::WHITE, |color, layer| color.blend(layer.color, alpha))
    }

    /// One rule per distinct layer combination, in first-seen order
    pub fn layer_rules(&self, spans: &[LayerSpan]) -> Vec<CssRule> {
        let mut seen: Vec<&LayerSet> = Vec::new();
        for span in spans {
            if !span.layers.is_empty() && !seen.contains(&&span.layers) {
                seen.push(&span.layers);
            }
        }

        seen.into_iter()
            .map(|set| CssRule {
                selector: format!("span.layered[{}=\"{}\"]", ATTR_LAYERS, set.attr_value()),
                declarations: vec![(
                    "border-bottom-color".to_string(),
                    self.blend(set).to_hex(),
                )],
            })
            .collect()
    }

    /// Wrap each span's text under `target` in a `span.layered` marker
    ///
    /// Span offsets are char offsets into the target's text as it was before
    /// any wrapping. Returns the markers created.
    pub fn apply(&self, doc: &mut Document, target: NodeId, spans: &[LayerSpan]) -> Vec<NodeId> {
        let ranges: Vec<_> = spans
            .iter()
            .map(|span| (span, map_range(doc, target, span.start, span.end)))
            .collect();

        let mut markers = Vec::new();
        for (span, ranges) in ranges {
            let value = span.layers.attr_value();
            for range in ranges {
                markers.extend(wrap_range(doc, range, |doc| {
                    doc.create_element("span", &[("class", "layered"), (ATTR_LAYERS, value.as_str())])
                }));
            }
        }
        markers
    }

    /// Settings CSS followed by the layer rules
    pub fn stylesheet(&self, spans: &[LayerSpan]) -> String {
        let mut css = self.settings.to_css();
        for rule in self.layer_rules(spans) {
            css.push('\n');
            css.push_str(&rule.to_string());
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> OverlayContext {
        OverlayContext::new(
            PrintSettings::default(),
            vec![
                Layer::new("red", Rgb::new(255, 0, 0)),
                Layer::new("blue", Rgb::new(0, 0, 255)),
            ],
        )
    }

    #[test]
    fn test_blend_single_layer() {
        let ctx = context();
        let set: LayerSet = ["red"].into_iter().collect();

        // 255 * 0.4 = 102
        assert_eq!(ctx.blend(&set), Rgb::new(255, 102, 102));
    }

    #[test]
    fn test_blend_is_sequential_in_set_order() {
        let ctx = context();
        let red_blue: LayerSet = ["red", "blue"].into_iter().collect();
        let blue_red: LayerSet = ["blue", "red"].into_iter().collect();

        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        assert_eq!(
            ctx.blend(&red_blue),
            Rgb::WHITE.blend(red, 0.3).blend(blue, 0.3)
        );
        assert_ne!(ctx.blend(&red_blue), ctx.blend(&blue_red));
    }

    #[test]
    fn test_blend_unknown_layers() {
        let ctx = context();
        let set: LayerSet = ["green"].into_iter().collect();
        assert_eq!(ctx.blend(&set), Rgb::WHITE);
    }

    #[test]
    fn test_blend_unknown_layer_still_counts_toward_opacity() {
        let ctx = context();
        let set: LayerSet = ["red", "green"].into_iter().collect();

        assert_eq!(ctx.blend(&set), Rgb::WHITE.blend(Rgb::new(255, 0, 0), 0.3));
        assert_ne!(ctx.blend(&set), ctx.blend(&["red"].into_iter().collect()));
    }

    #[test]
    fn test_layer_rules_one_per_combination() {
        let ctx = context();
        let spans = compose_spans(&[
            LayerHighlight::new("red", 0, 10),
            LayerHighlight::new("blue", 5, 15),
            LayerHighlight::new("red", 20, 25),
        ]);

        let rules = ctx.layer_rules(&spans);

        let selectors: Vec<&str> = rules.iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(
            selectors,
            vec![
                r#"span.layered[data-layers="red"]"#,
                r#"span.layered[data-layers="red blue"]"#,
                r#"span.layered[data-layers="blue"]"#,
            ]
        );
        assert_eq!(
            rules[0].to_string(),
            r#"span.layered[data-layers="red"] { border-bottom-color: #ff6666; }"#
        );
    }

    #[test]
    fn test_apply_wraps_spans() {
        let mut doc = Document::parse(r#"<p id="t">abcdefghij</p>"#).unwrap();
        let target = doc.find_by_id("t").unwrap();
        let spans = compose_spans(&[
            LayerHighlight::new("red", 0, 6),
            LayerHighlight::new("blue", 4, 8),
        ]);

        let markers = context().apply(&mut doc, target, &spans);

        assert_eq!(markers.len(), 3);
        assert_eq!(
            doc.inner_html(target),
            concat!(
                r#"<span class="layered" data-layers="red">abcd</span>"#,
                r#"<span class="layered" data-layers="red blue">ef</span>"#,
                r#"<span class="layered" data-layers="blue">gh</span>ij"#
            )
        );
    }

    #[test]
    fn test_stylesheet_combines_settings_and_rules() {
        let ctx = context();
        let spans = compose_spans(&[LayerHighlight::new("blue", 0, 3)]);

        let css = ctx.stylesheet(&spans);

        assert!(css.starts_with("body {"));
        assert!(css.ends_with(r#"span.layered[data-layers="blue"] { border-bottom-color: #6666ff; }"#));
    }
}
