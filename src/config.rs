use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::parser::ExtractionConfig;

pub const DEFAULT_CONFIG_FILE: &str = "scraper.toml";
const ENV_PREFIX: &str = "SCRAPER";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fetch: FetchSettings,
    pub batch: BatchSettings,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Scraping-proxy endpoint; requests go to `{api_url}?token=..&url=..`.
    pub api_url: Option<String>,
    pub api_token: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            timeout_secs: 30,
            user_agent: concat!("content_scraper/", env!("CARGO_PKG_VERSION")).to_string(),
            api_url: None,
            api_token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub structure_file: PathBuf,
    pub output_dir: PathBuf,
    pub summary_file: PathBuf,
    /// Minimum gap between two fetch starts.
    pub delay_ms: u64,
    pub concurrency: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        BatchSettings {
            structure_file: PathBuf::from("site_structure.json"),
            output_dir: PathBuf::from("scraped_content"),
            summary_file: PathBuf::from("scraping_summary.json"),
            delay_ms: 1500,
            concurrency: 1,
            max_retries: 2,
            retry_backoff_ms: 2000,
        }
    }
}

/// Defaults, then the config file (`scraper.toml` if present, or the one
/// given explicitly, which must exist), then `SCRAPER_*` environment
/// variables with `__` between nested keys.
pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

// ── Tests ──
