//! Amnesia Comics
//!
//! Opens a comic archive, detects the panels of every page and prints them in
//! reading order.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use amnesia_comics::archive::{is_comic_path, ArchiveResourceCache, ZipExtractor};
use amnesia_comics::panels::{NormalizedBox, PanelDetector, ReadingDirection};
use amnesia_comics::Config;

#[derive(Parser)]
#[command(name = "amnesia-comics")]
#[command(about = "Detect comic panels and print them in reading order")]
#[command(version)]
struct Cli {
    /// Comic archive (.cbz)
    archive: PathBuf,

    /// Read panels right to left (manga)
    #[arg(long)]
    rtl: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Only analyse this page (0-based)
    #[arg(short, long)]
    page: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageReport {
    index: usize,
    name: String,
    image_width: u32,
    image_height: u32,
    crop_box: NormalizedBox,
    panels: Vec<NormalizedBox>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amnesia_comics=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    if !is_comic_path(&cli.archive) {
        tracing::warn!(path = %cli.archive.display(), "Not a comic archive extension, trying ZIP anyway");
    }

    let direction = if cli.rtl {
        ReadingDirection::Rtl
    } else {
        ReadingDirection::Ltr
    };

    let mut cache =
        ArchiveResourceCache::with_window(config.cache.window_size(), config.cache.prune_buffer);
    cache
        .open_path(Arc::new(ZipExtractor), &cli.archive)
        .await
        .with_context(|| format!("Failed to open {}", cli.archive.display()))?;

    let detector = PanelDetector::new(&config.analysis);

    let pages: Vec<_> = cache
        .pages()
        .iter()
        .filter(|page| cli.page.map_or(true, |only| page.index == only))
        .cloned()
        .collect();

    if pages.is_empty() {
        anyhow::bail!("No matching page images in {}", cli.archive.display());
    }

    // Analyse pages concurrently, report in page order
    let mut handles = Vec::with_capacity(pages.len());
    for page in pages {
        let detector = detector.clone();
        handles.push(tokio::spawn(async move {
            let result = detector
                .analyze_page(page.index, Arc::clone(&page.bytes))
                .await
                .unwrap_or_else(|_| PanelDetector::fallback_for(&page.bytes));
            PageReport {
                index: page.index,
                name: page.name,
                image_width: result.image_width,
                image_height: result.image_height,
                crop_box: result.crop_box,
                panels: result.reading_panels(direction),
            }
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await.context("Analysis task failed")?);
    }

    cache.release();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{:>4}  {}  {}x{}  {} panel(s)",
            report.index,
            report.name,
            report.image_width,
            report.image_height,
            report.panels.len()
        );
        for (n, panel) in report.panels.iter().enumerate() {
            println!(
                "      {:>2}. x={:.3} y={:.3} w={:.3} h={:.3}",
                n + 1,
                panel.x,
                panel.y,
                panel.w,
                panel.h
            );
        }
    }

    Ok(())
}
