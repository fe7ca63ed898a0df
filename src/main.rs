mod batch;
mod config;
mod error;
mod fetch;
mod parser;
mod pipeline;
mod sitemap;
mod store;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::parser::Extractor;
use crate::pipeline::{PagePipeline, RenderedPage};

#[derive(Parser)]
#[command(name = "content_scraper", about = "Extract clean flow text from web pages")]
struct Cli {
    /// Config file (default: ./scraper.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a sitemap and write the work list
    Init {
        /// sitemap.xml URL
        #[arg(long)]
        sitemap: String,
        /// Keep only URLs starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Work list file (default: batch.structure_file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch, extract and save every page in the work list
    Scrape {
        /// Max pages to scrape (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        structure: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Minimum gap between fetches
        #[arg(long)]
        delay_ms: Option<u64>,
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Process a single URL and print the flow text
    Page {
        url: String,
        /// Print the extracted document as JSON instead
        #[arg(long)]
        json: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert saved .html files without fetching
    Extract {
        input_dir: PathBuf,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the summary of the last scrape
    Stats {
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    debug!(
        delay_ms = settings.batch.delay_ms,
        concurrency = settings.batch.concurrency,
        proxy = settings.fetch.api_url.is_some(),
        "settings loaded"
    );

    let result = match cli.command {
        Commands::Init { sitemap, prefix, output } => {
            let fetcher = HttpFetcher::new(&settings.fetch)?;
            let structure = sitemap::build_structure(&fetcher, &sitemap, prefix.as_deref()).await?;
            let path = output.unwrap_or(settings.batch.structure_file);
            store::save_structure(&path, &structure)?;
            println!("Wrote {} page URLs to {}", structure.pages.len(), path.display());
            Ok(())
        }
        Commands::Scrape { limit, structure, output_dir, delay_ms, concurrency } => {
            if let Some(path) = structure {
                settings.batch.structure_file = path;
            }
            if let Some(dir) = output_dir {
                settings.batch.output_dir = dir;
            }
            if let Some(ms) = delay_ms {
                settings.batch.delay_ms = ms;
            }
            if let Some(n) = concurrency {
                settings.batch.concurrency = n;
            }

            let work = store::load_structure(&settings.batch.structure_file)
                .context("Failed to read work list (run 'init' first?)")?;
            let urls = batch::select_pages(work.pages, limit);
            if urls.is_empty() {
                println!("No pages to scrape. Run 'init' first or check the work list.");
                return Ok(());
            }

            println!(
                "Scraping {} pages (delay {}ms, concurrency {})...",
                urls.len(),
                settings.batch.delay_ms,
                settings.batch.concurrency
            );
            let pipeline = Arc::new(build_pipeline(&settings)?);
            let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&settings.fetch)?);
            let summary = batch::run_batch(&settings.batch, pipeline, fetcher, urls).await?;
            println!(
                "Done: {} pages ({} ok, {} errors). Output in {}, summary in {}",
                summary.total_pages,
                summary.successfully_scraped,
                summary.failed,
                settings.batch.output_dir.display(),
                settings.batch.summary_file.display()
            );
            Ok(())
        }
        Commands::Page { url, json, output } => {
            let pipeline = build_pipeline(&settings)?;
            let fetcher = HttpFetcher::new(&settings.fetch)?;
            let page = pipeline.process(&url, &fetcher).await?;
            let text = if json {
                serde_json::to_string_pretty(&page.document)?
            } else {
                page.text
            };
            match output {
                Some(path) => {
                    fs::write(&path, &text).with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Saved {} ({} lines)", path.display(), store::line_count(&text));
                }
                None => println!("{}", text),
            }
            Ok(())
        }
        Commands::Extract { input_dir, output_dir } => {
            let pipeline = build_pipeline(&settings)?;
            let output = output_dir.unwrap_or(settings.batch.output_dir);
            let (ok, failed) = extract_dir(&pipeline, &input_dir, &output)?;
            println!("Extracted {} files ({} failed) into {}", ok, failed, output.display());
            Ok(())
        }
        Commands::Stats { summary } => {
            let path = summary.unwrap_or(settings.batch.summary_file);
            let s = store::load_summary(&path)?;
            println!("Total:     {}", s.total_pages);
            println!("Scraped:   {}", s.successfully_scraped);
            println!("Failed:    {}", s.failed);
            println!("Started:   {}", s.started_at.format("%Y-%m-%d %H:%M:%S"));
            println!(
                "Duration:  {}",
                format_duration((s.finished_at - s.started_at).to_std().unwrap_or_default())
            );
            let lines: usize = s.pages.iter().map(|p| p.lines).sum();
            println!("Lines:     {}", lines);

            if !s.errors.is_empty() {
                println!("\n--- Errors ---");
                for e in &s.errors {
                    println!("  {:<60} {}", truncate(&e.url, 60), truncate(&e.error, 40));
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build_pipeline(settings: &Settings) -> anyhow::Result<PagePipeline> {
    let extractor = Extractor::new(settings.extraction.clone())
        .context("Invalid extraction.extra_noise_patterns")?;
    Ok(PagePipeline::new(extractor))
}

/// Offline conversion of `*.html` files. Each file path is used as the
/// page's source identifier.
fn extract_dir(pipeline: &PagePipeline, input: &Path, output: &Path) -> anyhow::Result<(usize, usize)> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let mut files: Vec<PathBuf> = fs::read_dir(input)
        .with_context(|| format!("Failed to read {}", input.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("html" | "htm")))
        .collect();
    files.sort();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut ok = 0usize;
    let mut failed = 0usize;

    for chunk in files.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|path| (path, render_file(pipeline, path)))
            .collect();

        for (path, result) in results {
            match result {
                Ok(page) => {
                    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("index");
                    let name = format!("{}.{}", stem, store::OUTPUT_EXTENSION);
                    store::write_document(output, &name, &page.text)?;
                    ok += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipped");
                    failed += 1;
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok((ok, failed))
}

fn render_file(pipeline: &PagePipeline, path: &Path) -> anyhow::Result<RenderedPage> {
    let html = fs::read_to_string(path)?;
    Ok(pipeline.process_html(&path.display().to_string(), &html)?)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──
