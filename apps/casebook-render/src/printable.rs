//! Printable page rendering
//!
//! Runs the whole pipeline over a casebook page:
//! 1. Scan the page for annotation records and layout flags
//! 2. Map every annotation against the untouched content tree
//! 3. Render annotations in input order
//! 4. Footnote external links in the content
//! 5. Lay out into the output container and serialize

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};

use crate::annotations::{scan_page, ScanError};
use crate::config::Config;
use crate::dom::Document;
use crate::error::{AnnotationError, RenderError, Result};
use crate::mapper::{map_all, NodeIndex};
use crate::print::{LayoutMode, PaginationEngine, PrintLayoutDriver};
use crate::render::{render_all, rewrite_external_links};

/// Rendered page plus what happened along the way
#[derive(Debug)]
pub struct PrintableOutput {
    /// Serialized document
    pub html: String,
    pub mode: LayoutMode,
    pub page_count: Option<usize>,
    /// Annotations that produced markup
    pub rendered: usize,
    /// Skipped or clamped annotations
    pub issues: Vec<AnnotationError>,
}

/// Render a casebook page for printing
pub async fn render_printable<E: PaginationEngine>(
    html: &str,
    config: &Config,
    engine: E,
) -> Result<PrintableOutput> {
    let manifest = scan_page(html)?;
    let mut doc = Document::parse(html)?;

    let content = doc
        .find_by_id(&config.render.content_id)
        .ok_or_else(|| RenderError::ContentRootMissing(config.render.content_id.clone()))?;
    let output = doc
        .find_by_id(&config.render.output_id)
        .ok_or_else(|| RenderError::OutputContainerMissing(config.render.output_id.clone()))?;

    let mut issues = manifest.malformed.clone();

    let index = NodeIndex::build(&doc, content);
    let report = map_all(&doc, &index, &manifest.annotations);
    issues.extend(report.issues);

    let results = render_all(&mut doc, &report.mapped);
    let links = rewrite_external_links(&mut doc, content, manifest.section_timestamp.as_ref());

    let mode = if config.render.force_flat {
        LayoutMode::Flat
    } else {
        LayoutMode::from_manifest(&manifest)
    };
    let driver = PrintLayoutDriver::new(engine, &config.render);
    let outcome = driver.run(&mut doc, content, output, mode, &results).await?;

    tracing::info!(
        "Rendered {} of {} annotation(s), {} issue(s), {} external link(s), layout {}",
        results.len(),
        manifest.annotations.len(),
        issues.len(),
        links.external,
        outcome.mode
    );

    Ok(PrintableOutput {
        html: doc.to_html(),
        mode: outcome.mode,
        page_count: outcome.page_count,
        rendered: results.len(),
        issues,
    })
}

/// Append a `<style>` block to the document head
pub fn inject_style(html: &str, css: &str) -> Result<String> {
    let style = format!("<style data-print-settings>\n{}\n</style>", css);

    let output = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("head", |el| {
                el.append(&style, ContentType::Html);
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| ScanError::RewriteError(e.to_string()))?;

    Ok(output)
}
