use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const OUTPUT_EXTENSION: &str = "md";
const INDEX_NAME: &str = "index";

static ORIGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://(?:www\.)?[^/?#]*/?").unwrap());
static UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w/-]").unwrap());
static UNDERSCORES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

// ── Work list ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteStructure {
    pub pages: Vec<PageEntry>,
}

pub fn load_structure(path: &Path) -> Result<SiteStructure, StoreError> {
    read_json(path)
}

pub fn save_structure(path: &Path, structure: &SiteStructure) -> Result<(), StoreError> {
    write_json(path, structure)
}

// ── Output documents ──

/// Deterministic relative file name for a page: path part of the URL with
/// unsafe characters replaced, `index` for the site root.
pub fn output_filename(url: &str) -> String {
    let path = ORIGIN_RE.replace(url, "");
    let safe = UNSAFE_RE.replace_all(&path, "_");
    let collapsed = UNDERSCORES_RE.replace_all(&safe, "_");
    let trimmed = collapsed.trim_matches(|c| c == '_' || c == '/');

    let stem = if trimmed.is_empty() { INDEX_NAME } else { trimmed };
    format!("{}.{}", stem, OUTPUT_EXTENSION)
}

/// Write `text` under `dir`, creating intermediate directories.
pub fn write_document(dir: &Path, filename: &str, text: &str) -> Result<PathBuf, StoreError> {
    let path = dir.join(filename);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(&path, text).map_err(|e| io_error(&path, e))?;
    Ok(path)
}

pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

// ── Run summary ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPage {
    pub url: String,
    pub filename: String,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedPage {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_pages: usize,
    pub successfully_scraped: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub pages: Vec<SavedPage>,
    pub errors: Vec<FailedPage>,
}

pub fn save_summary(path: &Path, summary: &RunSummary) -> Result<(), StoreError> {
    write_json(path, summary)
}

pub fn load_summary(path: &Path) -> Result<RunSummary, StoreError> {
    read_json(path)
}

// ── Helpers ──

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, StoreError> {
    let raw = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.display().to_string(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    fs::write(path, json).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

// ── Tests ──
