//! Contentful delivery/preview API client.
//!
//! Wraps the content delivery API with bearer-token auth and exposes the
//! listings the site renders (events, projects, blog posts, sermons). All
//! responses go through [`fetch_records`], so callers always get
//! [`DisplayRecord`]s with links already resolved.
//!
//! # Configuration
//!
//! ```toml
//! [contentful]
//! space_id = "abc123"
//! access_token = "..."     # or CONTENTFUL_ACCESS_TOKEN
//! preview_token = "..."    # required when preview = true
//! preview = false
//! ```

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::time::Duration;

use ekklesia_core::delivery::parse_entry;
use ekklesia_core::models::{DisplayRecord, IncludesTable};
use ekklesia_core::normalize::normalize;

use crate::config::ContentfulConfig;
use crate::traits::{fetch_records, ContentSource, EntryQuery};

/// Content types searched by [`ContentfulClient::search_content`] by default.
pub const DEFAULT_SEARCH_TYPES: &[&str] = &["blogPost", "event", "project"];

/// Per-type page size for [`ContentfulClient::search_content`].
const SEARCH_PAGE_SIZE: usize = 10;

pub struct ContentfulClient {
    http: reqwest::Client,
    base_url: String,
    space_id: String,
    token: String,
    include_depth: u8,
    preview: bool,
}

impl ContentfulClient {
    /// Build a client from config, picking the preview API when enabled.
    pub fn from_config(config: &ContentfulConfig) -> Result<Self> {
        let space_id = config
            .space_id
            .clone()
            .ok_or_else(|| anyhow!("contentful.space_id is not configured"))?;

        let (base_url, token) = if config.preview {
            let token = config
                .resolved_preview_token()
                .ok_or_else(|| anyhow!("No Contentful preview token configured"))?;
            (config.preview_url.clone(), token)
        } else {
            let token = config.resolved_access_token().ok_or_else(|| {
                anyhow!("No Contentful access token. Set contentful.access_token or CONTENTFUL_ACCESS_TOKEN.")
            })?;
            (config.delivery_url.clone(), token)
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            space_id,
            token,
            include_depth: config.include_depth,
            preview: config.preview,
        })
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "contentful request");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Contentful request failed: {}", url))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        resp.json::<Value>()
            .await
            .context("Contentful returned invalid JSON")
    }

    /// Check the space is reachable with the configured token.
    pub async fn test_connection(&self) -> Result<()> {
        let json = self
            .get_json(&format!("/spaces/{}", self.space_id), &[])
            .await?;
        if json.get("sys").is_none() {
            bail!("Invalid Contentful configuration");
        }
        Ok(())
    }

    /// Entries matching `query`, normalized.
    pub async fn get_entries(&self, query: &EntryQuery) -> Result<Vec<DisplayRecord>> {
        fetch_records(self, query).await
    }

    /// A single entry by id.
    ///
    /// The single-entry endpoint returns no `includes`, so links on the
    /// returned record stay unresolved.
    pub async fn get_entry(&self, entry_id: &str) -> Result<DisplayRecord> {
        let json = self
            .get_json(
                &format!("/spaces/{}/entries/{}", self.space_id, entry_id),
                &[],
            )
            .await?;
        let entry = parse_entry(&json)?;
        Ok(normalize(&entry, &IncludesTable::new()))
    }

    fn query(&self, content_type: &str) -> EntryQuery {
        EntryQuery::new(content_type).include(self.include_depth)
    }

    pub async fn events(&self, limit: usize) -> Result<Vec<DisplayRecord>> {
        let q = self.query("event").limit(limit).order("fields.startDate");
        self.get_entries(&q).await
    }

    /// Events starting at or after `now`, soonest first.
    pub async fn upcoming_events(
        &self,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<DisplayRecord>> {
        let q = self
            .query("event")
            .limit(limit)
            .filter(
                "fields.startDate[gte]",
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            )
            .order("fields.startDate");
        self.get_entries(&q).await
    }

    pub async fn projects(&self, limit: usize) -> Result<Vec<DisplayRecord>> {
        let q = self
            .query("project")
            .limit(limit)
            .order("-fields.priority,fields.targetDate");
        self.get_entries(&q).await
    }

    pub async fn active_projects(&self, limit: usize) -> Result<Vec<DisplayRecord>> {
        let q = self
            .query("project")
            .limit(limit)
            .filter("fields.status", "active")
            .order("-fields.priority,fields.targetDate");
        self.get_entries(&q).await
    }

    pub async fn blog_posts(&self, limit: usize) -> Result<Vec<DisplayRecord>> {
        let q = self
            .query("blogPost")
            .limit(limit)
            .order("-fields.publishDate");
        self.get_entries(&q).await
    }

    pub async fn published_blog_posts(&self, limit: usize) -> Result<Vec<DisplayRecord>> {
        let q = self
            .query("blogPost")
            .limit(limit)
            .filter("fields.published", "true")
            .order("-fields.publishDate");
        self.get_entries(&q).await
    }

    pub async fn featured_blog_posts(&self, limit: usize) -> Result<Vec<DisplayRecord>> {
        let q = self
            .query("blogPost")
            .limit(limit)
            .filter("fields.featured", "true")
            .filter("fields.published", "true")
            .order("-fields.publishDate");
        self.get_entries(&q).await
    }

    pub async fn sermons(&self, limit: usize) -> Result<Vec<DisplayRecord>> {
        let q = self.query("sermon").limit(limit).order("-fields.date");
        self.get_entries(&q).await
    }

    /// Full-text search across several content types.
    ///
    /// A failing type is logged and skipped. Results are merged newest
    /// `updated_at` first.
    pub async fn search_content(
        &self,
        query: &str,
        content_types: &[&str],
    ) -> Result<Vec<DisplayRecord>> {
        let mut results = Vec::new();
        for ct in content_types {
            let q = self
                .query(ct)
                .limit(SEARCH_PAGE_SIZE)
                .filter("query", query);
            match self.get_entries(&q).await {
                Ok(records) => results.extend(records),
                Err(e) => {
                    tracing::warn!(content_type = %ct, error = %e, "search failed for content type");
                }
            }
        }
        sort_by_updated_desc(&mut results);
        Ok(results)
    }
}

#[async_trait]
impl ContentSource for ContentfulClient {
    fn name(&self) -> &str {
        if self.preview {
            "contentful-preview"
        } else {
            "contentful"
        }
    }

    async fn fetch_entries(&self, query: &EntryQuery) -> Result<Value> {
        self.get_json(
            &format!("/spaces/{}/entries", self.space_id),
            &query.to_params(),
        )
        .await
    }
}

/// Map a non-success HTTP status to a user-facing error.
pub fn classify_status(status: u16) -> anyhow::Error {
    match status {
        401 => anyhow!("Invalid Contentful access token"),
        404 => anyhow!("Contentful space or content not found"),
        429 => anyhow!("Contentful API rate limit exceeded"),
        other => anyhow!("Contentful API error: HTTP {}", other),
    }
}

/// Stable sort, newest `updated_at` first; undated records go last.
pub fn sort_by_updated_desc(records: &mut [DisplayRecord]) {
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ekklesia_core::models::RawEntry;

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(401).to_string(),
            "Invalid Contentful access token"
        );
        assert_eq!(
            classify_status(404).to_string(),
            "Contentful space or content not found"
        );
        assert_eq!(
            classify_status(429).to_string(),
            "Contentful API rate limit exceeded"
        );
        assert_eq!(
            classify_status(500).to_string(),
            "Contentful API error: HTTP 500"
        );
    }

    #[test]
    fn test_sort_by_updated_desc() {
        let includes = IncludesTable::new();
        let mut a = RawEntry::new("a", "event");
        a.updated_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut b = RawEntry::new("b", "event");
        b.updated_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let c = RawEntry::new("c", "event");

        let mut records = vec![normalize(&a, &includes), normalize(&c, &includes), normalize(&b, &includes)];
        sort_by_updated_desc(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_from_config_requires_space_and_token() {
        let mut cfg = ContentfulConfig::default();
        assert!(ContentfulClient::from_config(&cfg).is_err());

        cfg.space_id = Some("space".into());
        cfg.access_token = Some("tok".into());
        let client = ContentfulClient::from_config(&cfg).unwrap();
        assert!(!client.is_preview());
        assert_eq!(client.name(), "contentful");
    }

    #[test]
    fn test_from_config_preview() {
        let cfg = ContentfulConfig {
            space_id: Some("space".into()),
            access_token: Some("tok".into()),
            preview_token: Some("ptok".into()),
            preview: true,
            ..Default::default()
        };
        let client = ContentfulClient::from_config(&cfg).unwrap();
        assert!(client.is_preview());
        assert_eq!(client.base_url, "https://preview.contentful.com");
        assert_eq!(client.token, "ptok");
    }
}
