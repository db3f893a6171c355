//! Configuration loading and validation.
//!
//! Settings come from a TOML file (default `./config/ekklesia.toml`). Every
//! section is optional; credentials may also come from the environment:
//!
//! | Setting | Environment fallback |
//! |---------|----------------------|
//! | `contentful.access_token` | `CONTENTFUL_ACCESS_TOKEN` |
//! | `contentful.preview_token` | `CONTENTFUL_PREVIEW_TOKEN` |
//! | `youtube.api_key` | `YOUTUBE_API_KEY` |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub contentful: ContentfulConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentfulConfig {
    #[serde(default)]
    pub space_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub preview_token: Option<String>,
    /// Read drafts from the preview API instead of published content.
    #[serde(default)]
    pub preview: bool,
    #[serde(default = "default_delivery_url")]
    pub delivery_url: String,
    #[serde(default = "default_preview_url")]
    pub preview_url: String,
    /// Link levels resolved into `includes` (0..=10).
    #[serde(default = "default_include_depth")]
    pub include_depth: u8,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ContentfulConfig {
    fn default() -> Self {
        Self {
            space_id: None,
            access_token: None,
            preview_token: None,
            preview: false,
            delivery_url: default_delivery_url(),
            preview_url: default_preview_url(),
            include_depth: default_include_depth(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_delivery_url() -> String {
    "https://cdn.contentful.com".to_string()
}
fn default_preview_url() -> String {
    "https://preview.contentful.com".to_string()
}
fn default_include_depth() -> u8 {
    2
}
fn default_timeout_secs() -> u64 {
    30
}

impl ContentfulConfig {
    pub fn is_configured(&self) -> bool {
        self.space_id.is_some() && self.resolved_access_token().is_some()
    }

    pub fn resolved_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var("CONTENTFUL_ACCESS_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }

    pub fn resolved_preview_token(&self) -> Option<String> {
        self.preview_token
            .clone()
            .or_else(|| std::env::var("CONTENTFUL_PREVIEW_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Page size for the single sermon listing request (1..=50).
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_youtube_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            channel_id: None,
            max_results: default_max_results(),
            api_url: default_youtube_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_results() -> u32 {
    20
}
fn default_youtube_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

impl YouTubeConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// JSON corpus file; the built-in site corpus is used when unset.
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            history_path: default_history_path(),
            history_limit: default_history_limit(),
            excerpt_chars: default_excerpt_chars(),
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from("./data/history.json")
}
fn default_history_limit() -> usize {
    ekklesia_core::history::HISTORY_LIMIT
}
fn default_excerpt_chars() -> usize {
    ekklesia_core::highlight::EXCERPT_CHARS
}

impl Config {
    /// All defaults; used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Load and validate a config file. A missing file yields [`Config::minimal`].
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::minimal());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;
    Ok(config)
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    use ekklesia_core::history::HISTORY_LIMIT;

    if config.contentful.include_depth > 10 {
        bail!("contentful.include_depth must be in [0, 10]");
    }
    if config.contentful.timeout_secs == 0 || config.youtube.timeout_secs == 0 {
        bail!("timeout_secs must be > 0");
    }
    if config.contentful.preview && config.contentful.resolved_preview_token().is_none() {
        bail!("contentful.preview requires a preview_token (or CONTENTFUL_PREVIEW_TOKEN)");
    }
    if !(1..=50).contains(&config.youtube.max_results) {
        bail!("youtube.max_results must be in [1, 50]");
    }
    if !(1..=HISTORY_LIMIT).contains(&config.search.history_limit) {
        bail!("search.history_limit must be in [1, {}]", HISTORY_LIMIT);
    }
    if config.search.excerpt_chars == 0 {
        bail!("search.excerpt_chars must be > 0");
    }
    Ok(())
}
