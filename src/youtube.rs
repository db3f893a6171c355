//! YouTube sermon listings and live-stream detection.
//!
//! Sermons are read from the church channel with two Data API calls: a
//! `search` for the latest matching videos, then one `videos` call for
//! durations and view counts. Only a single page is fetched.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use crate::config::YouTubeConfig;

/// Search terms used to pick sermon videos out of the channel uploads.
pub const SERMON_QUERY: &str = "sermon OR preaching OR message";

/// A channel video joined with its details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sermon {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    /// ISO 8601 duration as returned by the API (`PT1H2M3S`).
    pub duration: Option<String>,
    pub view_count: Option<u64>,
}

impl Sermon {
    pub fn watch_url(&self) -> String {
        watch_url(&self.video_id)
    }

    /// `h:mm:ss` or `m:ss`, when the duration is known.
    pub fn display_duration(&self) -> Option<String> {
        self.duration.as_deref().and_then(parse_duration)
    }

    fn haystack(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

// ── API wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    content_details: Option<ContentDetails>,
    #[serde(default)]
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    /// The API sends counts as decimal strings.
    #[serde(default)]
    view_count: Option<String>,
}

// ── client ──────────────────────────────────────────────────────────────

pub struct YouTubeClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    channel_id: String,
    max_results: u32,
}

impl YouTubeClient {
    pub fn from_config(config: &YouTubeConfig) -> Result<Self> {
        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| anyhow!("No YouTube API key. Set youtube.api_key or YOUTUBE_API_KEY."))?;
        let channel_id = config
            .channel_id
            .clone()
            .ok_or_else(|| anyhow!("youtube.channel_id is not configured"))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            channel_id,
            max_results: config.max_results,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.api_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .with_context(|| format!("YouTube request failed: {}", endpoint))?;

        if !resp.status().is_success() {
            bail!("YouTube API error (HTTP {}) on {}", resp.status(), endpoint);
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("Invalid YouTube {} response", endpoint))
    }

    /// Latest sermons, newest first. `limit` overrides `max_results`.
    pub async fn load_sermons(&self, limit: Option<u32>) -> Result<Vec<Sermon>> {
        let max_results = limit.unwrap_or(self.max_results).clamp(1, 50);
        let search: SearchListResponse = self
            .get(
                "search",
                &[
                    ("channelId", self.channel_id.clone()),
                    ("part", "snippet".to_string()),
                    ("order", "date".to_string()),
                    ("maxResults", max_results.to_string()),
                    ("type", "video".to_string()),
                    ("q", SERMON_QUERY.to_string()),
                ],
            )
            .await?;

        let ids: Vec<&str> = search
            .items
            .iter()
            .filter_map(|item| item.id.video_id.as_deref())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let details: VideoListResponse = self
            .get(
                "videos",
                &[
                    ("id", ids.join(",")),
                    ("part", "contentDetails,statistics".to_string()),
                ],
            )
            .await?;

        let sermons = join_details(search, details);
        tracing::debug!(count = sermons.len(), "loaded sermons");
        Ok(sermons)
    }

    /// The channel's current live broadcast, if any.
    pub async fn check_live_stream(&self) -> Result<Option<Sermon>> {
        let search: SearchListResponse = self
            .get(
                "search",
                &[
                    ("channelId", self.channel_id.clone()),
                    ("part", "snippet".to_string()),
                    ("eventType", "live".to_string()),
                    ("type", "video".to_string()),
                    ("maxResults", "1".to_string()),
                ],
            )
            .await?;

        Ok(search.items.into_iter().find_map(|item| {
            let video_id = item.id.video_id?;
            Some(from_snippet(video_id, item.snippet))
        }))
    }
}

fn from_snippet(video_id: String, snippet: Snippet) -> Sermon {
    let thumbnail_url = ["medium", "high", "default"]
        .iter()
        .find_map(|k| snippet.thumbnails.get(*k))
        .map(|t| t.url.clone());
    Sermon {
        video_id,
        title: snippet.title,
        description: snippet.description,
        published_at: snippet.published_at,
        thumbnail_url,
        duration: None,
        view_count: None,
    }
}

/// Attach durations and view counts to search results, keeping search order.
fn join_details(search: SearchListResponse, details: VideoListResponse) -> Vec<Sermon> {
    let by_id: HashMap<String, VideoItem> = details
        .items
        .into_iter()
        .map(|v| (v.id.clone(), v))
        .collect();

    search
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let mut sermon = from_snippet(video_id, item.snippet);
            if let Some(detail) = by_id.get(&sermon.video_id) {
                sermon.duration = detail
                    .content_details
                    .as_ref()
                    .and_then(|c| c.duration.clone());
                sermon.view_count = detail
                    .statistics
                    .as_ref()
                    .and_then(|s| s.view_count.as_deref())
                    .and_then(|v| v.parse().ok());
            }
            Some(sermon)
        })
        .collect()
}

// ── pure helpers ────────────────────────────────────────────────────────

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

fn duration_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").ok())
        .as_ref()
}

/// Format an ISO 8601 duration as `h:mm:ss`, or `m:ss` under an hour.
///
/// Returns `None` when the string is not a `PT...` duration with at least
/// one component.
pub fn parse_duration(iso: &str) -> Option<String> {
    let caps = duration_re()?.captures(iso.trim())?;
    if (1..=3).all(|i| caps.get(i).is_none()) {
        return None;
    }
    let part = |i: usize| caps.get(i).map(|m| m.as_str());
    let minutes = part(2);
    let seconds = part(3).unwrap_or("0");

    Some(match part(1) {
        Some(hours) => format!(
            "{}:{:0>2}:{:0>2}",
            hours,
            minutes.unwrap_or("0"),
            seconds
        ),
        None => format!("{}:{:0>2}", minutes.unwrap_or("0"), seconds),
    })
}

/// Compact view count: `1.5K`, `2.3M`, or the plain number.
pub fn format_view_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Sermons whose title or description contains `term` (case-insensitive).
pub fn filter_sermons<'a>(sermons: &'a [Sermon], term: &str) -> Vec<&'a Sermon> {
    let term = term.trim().to_lowercase();
    sermons
        .iter()
        .filter(|s| term.is_empty() || s.haystack().contains(&term))
        .collect()
}

/// Keyword-based sermon grouping used by the sermons page filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SermonCategory {
    Sunday,
    Series,
    Special,
    Youth,
}

impl SermonCategory {
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            SermonCategory::Sunday => &["sunday", "worship"],
            SermonCategory::Series => &["series", "part"],
            SermonCategory::Special => &["special", "event"],
            SermonCategory::Youth => &["youth", "young"],
        }
    }

    pub fn matches(&self, sermon: &Sermon) -> bool {
        let haystack = sermon.haystack();
        self.keywords().iter().any(|k| haystack.contains(k))
    }

    pub fn filter<'a>(&self, sermons: &'a [Sermon]) -> Vec<&'a Sermon> {
        sermons.iter().filter(|s| self.matches(s)).collect()
    }
}

impl FromStr for SermonCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sunday" => Ok(SermonCategory::Sunday),
            "series" => Ok(SermonCategory::Series),
            "special" => Ok(SermonCategory::Special),
            "youth" => Ok(SermonCategory::Youth),
            other => bail!(
                "Unknown sermon category: {}. Use sunday, series, special, or youth.",
                other
            ),
        }
    }
}

impl fmt::Display for SermonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SermonCategory::Sunday => "sunday",
            SermonCategory::Series => "series",
            SermonCategory::Special => "special",
            SermonCategory::Youth => "youth",
        };
        f.write_str(s)
    }
}

// ── commands ────────────────────────────────────────────────────────────

/// `ekk sermons`: list recent sermons, optionally filtered.
pub async fn run_sermons(
    config: &crate::config::Config,
    limit: Option<u32>,
    category: Option<SermonCategory>,
    term: Option<&str>,
    json: bool,
) -> Result<()> {
    let client = YouTubeClient::from_config(&config.youtube)?;
    let sermons = client.load_sermons(limit).await?;

    let mut shown: Vec<&Sermon> = match category {
        Some(cat) => cat.filter(&sermons),
        None => sermons.iter().collect(),
    };
    if let Some(term) = term {
        let keep: Vec<&str> = filter_sermons(&sermons, term)
            .iter()
            .map(|s| s.video_id.as_str())
            .collect();
        shown.retain(|s| keep.contains(&s.video_id.as_str()));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }
    if shown.is_empty() {
        println!("No sermons found.");
        return Ok(());
    }
    for sermon in shown {
        let date = sermon
            .published_at
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_default();
        println!("{}", sermon.title);
        println!(
            "    {}  {}  {} views",
            date,
            sermon.display_duration().unwrap_or_else(|| "-".to_string()),
            sermon
                .view_count
                .map(format_view_count)
                .unwrap_or_else(|| "-".to_string())
        );
        println!("    {}", sermon.watch_url());
        println!();
    }
    Ok(())
}

/// `ekk live`: report whether the channel is broadcasting.
pub async fn run_live(config: &crate::config::Config) -> Result<()> {
    let client = YouTubeClient::from_config(&config.youtube)?;
    match client.check_live_stream().await? {
        Some(live) => {
            println!("LIVE: {}", live.title);
            println!("    {}", live.watch_url());
        }
        None => println!("Not live."),
    }
    Ok(())
}
