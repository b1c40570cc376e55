//! Casebook Render
//!
//! Renders an annotated casebook page for printing: applies annotation
//! markup, footnotes links and notes, and lays the result out flat or in
//! pages, ready for a headless browser to export.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use casebook_render::overlay::{OverlayContext, PrintSettings};
use casebook_render::print::FlowPaginator;
use casebook_render::printable::inject_style;
use casebook_render::{render_printable, Config};

#[derive(Parser)]
#[command(version, about = "Render annotated casebook pages for print", long_about = None)]
struct Cli {
    /// Page HTML to render
    input: PathBuf,

    /// Write the rendered page here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Lay out flat even if the page asks for pagination
    #[arg(long)]
    flat: bool,

    /// JSON print settings; adds a stylesheet to the page head
    #[arg(long, env = "CASEBOOK_PRINT_SETTINGS")]
    print_settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout can carry the page
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "casebook_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });
    config.render.force_flat |= cli.flat;

    tracing::info!("Casebook Render v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Content #{} -> #{}", config.render.content_id, config.render.output_id);

    let html = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let engine = FlowPaginator::new(config.pagination.chars_per_page);
    let rendered = render_printable(&html, &config, engine)
        .await
        .with_context(|| format!("Failed to render {}", cli.input.display()))?;

    for issue in &rendered.issues {
        tracing::debug!("Annotation issue: {}", issue);
    }

    let mut page = rendered.html;
    if let Some(path) = &cli.print_settings {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: PrintSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid print settings in {}", path.display()))?;
        let css = OverlayContext::new(settings, Vec::new()).stylesheet(&[]);
        page = inject_style(&page, &css)?;
    }

    match &cli.output {
        Some(path) => tokio::fs::write(path, page)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", page),
    }

    tracing::info!(
        "Done: {} annotation(s) rendered, {} issue(s), layout {}{}",
        rendered.rendered,
        rendered.issues.len(),
        rendered.mode,
        rendered
            .page_count
            .map(|n| format!(", {} page(s)", n))
            .unwrap_or_default()
    );

    Ok(())
}
