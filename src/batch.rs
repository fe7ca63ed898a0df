use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::BatchSettings;
use crate::error::{FetchError, PageError};
use crate::fetch::{Fetcher, Throttle};
use crate::pipeline::{PagePipeline, RenderedPage};
use crate::store::{self, FailedPage, PageEntry, RunSummary, SavedPage};

/// `HTTP {code}` fetch failures worth another attempt, besides timeouts.
const TRANSIENT_STATUS: &[u16] = &[429, 500, 502, 503, 504];
const MAX_BACKOFF: Duration = Duration::from_secs(300);
const WORKER_FAILED: &str = "worker task failed";

struct Outcome {
    index: usize,
    url: String,
    result: Result<RenderedPage, PageError>,
}

/// Work-list entries that reach the pipeline: HTTP(S) only, capped by `limit`.
pub fn select_pages(pages: Vec<PageEntry>, limit: Option<usize>) -> Vec<String> {
    let mut urls = Vec::new();
    for page in pages {
        if !(page.url.starts_with("http://") || page.url.starts_with("https://")) {
            info!(url = %page.url, "skipping non-http url");
            continue;
        }
        urls.push(page.url);
    }
    if let Some(n) = limit {
        urls.truncate(n);
    }
    urls
}

/// Run every page through the pipeline, writing each document as soon as it
/// arrives. Page failures are recorded, never fatal; only a failure to write
/// the summary aborts.
pub async fn run_batch(
    settings: &BatchSettings,
    pipeline: Arc<PagePipeline>,
    fetcher: Arc<dyn Fetcher>,
    urls: Vec<String>,
) -> Result<RunSummary> {
    let started_at = Utc::now();
    let total = urls.len();
    let concurrency = settings.concurrency.max(1);

    let throttle = Arc::new(Throttle::new(Duration::from_millis(settings.delay_ms)));
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let retry = RetryPolicy {
        max_retries: settings.max_retries,
        base_backoff: Duration::from_millis(settings.retry_backoff_ms),
    };

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Workers send outcomes, this task writes files and keeps the tally
    let (tx, mut rx) = mpsc::channel::<Outcome>(concurrency * 2);
    let mut tasks = JoinSet::new();
    let mut reported = vec![false; total];

    for (index, url) in urls.iter().cloned().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        let fetcher = Arc::clone(&fetcher);
        let throttle = Arc::clone(&throttle);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tasks.spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let result = process_with_retry(&pipeline, &*fetcher, &throttle, &url, retry).await;
            let _ = tx.send(Outcome { index, url, result }).await;
        });
    }

    drop(tx);

    let mut saved: Vec<(usize, SavedPage)> = Vec::new();
    let mut failed: Vec<(usize, FailedPage)> = Vec::new();

    while let Some(Outcome { index, url, result }) = rx.recv().await {
        reported[index] = true;
        match result.map_err(|e| e.to_string()).and_then(|page| save_page(settings, &page)) {
            Ok(page) => {
                info!(url = %page.url, filename = %page.filename, lines = page.lines, "saved");
                saved.push((index, page));
            }
            Err(error) => {
                warn!(%url, %error, "page failed");
                failed.push((index, FailedPage { url, error }));
            }
        }
        pb.inc(1);
    }

    // A worker that died before reporting still counts as a failed page
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "worker task failed");
        }
    }
    for (index, url) in urls.into_iter().enumerate() {
        if !reported[index] {
            failed.push((index, FailedPage { url, error: WORKER_FAILED.to_string() }));
            pb.inc(1);
        }
    }

    pb.finish_and_clear();

    saved.sort_by_key(|(i, _)| *i);
    failed.sort_by_key(|(i, _)| *i);

    let summary = RunSummary {
        total_pages: total,
        successfully_scraped: saved.len(),
        failed: failed.len(),
        started_at,
        finished_at: Utc::now(),
        pages: saved.into_iter().map(|(_, p)| p).collect(),
        errors: failed.into_iter().map(|(_, f)| f).collect(),
    };
    store::save_summary(&settings.summary_file, &summary)?;
    info!(
        "Processed {} pages ({} ok, {} errors)",
        summary.total_pages, summary.successfully_scraped, summary.failed
    );

    Ok(summary)
}

fn save_page(settings: &BatchSettings, page: &RenderedPage) -> Result<SavedPage, String> {
    let filename = store::output_filename(&page.url);
    store::write_document(&settings.output_dir, &filename, &page.text).map_err(|e| e.to_string())?;
    Ok(SavedPage {
        url: page.url.clone(),
        filename,
        lines: store::line_count(&page.text),
    })
}

#[derive(Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    base_backoff: Duration,
}

async fn process_with_retry(
    pipeline: &PagePipeline,
    fetcher: &dyn Fetcher,
    throttle: &Throttle,
    url: &str,
    retry: RetryPolicy,
) -> Result<RenderedPage, PageError> {
    let mut attempt = 0;
    loop {
        throttle.wait().await;
        match pipeline.process(url, fetcher).await {
            Err(PageError::Fetch(e)) if attempt < retry.max_retries && is_transient(&e) => {
                let backoff = backoff_for(retry.base_backoff, attempt);
                warn!(
                    "Fetch failed on {} ({}), attempt {}/{}, backing off {:.1}s",
                    url,
                    e,
                    attempt + 1,
                    retry.max_retries,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// `base * 2^attempt`, capped at [`MAX_BACKOFF`].
fn backoff_for(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF)
}

fn is_transient(err: &FetchError) -> bool {
    let reason = err.reason();
    match reason.strip_prefix("HTTP ") {
        Some(code) => code
            .trim()
            .parse::<u16>()
            .is_ok_and(|code| TRANSIENT_STATUS.contains(&code)),
        None => reason.eq_ignore_ascii_case("timeout"),
    }
}

// ── Tests ──
