//! Content source extension point.
//!
//! A [`ContentSource`] returns a raw delivery-API response for an
//! [`EntryQuery`]. Everything downstream (parsing, link resolution,
//! rendering) works the same regardless of where the response came from:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ContentSource               │
//! │  ┌────────────┐ ┌──────────┐ ┌────────┐  │
//! │  │ Contentful │ │   File   │ │ Custom │  │
//! │  │ (HTTP)     │ │ (saved)  │ │ (Rust) │  │
//! │  └────────────┘ └──────────┘ └────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!   parse_response() → normalize_batch() → DisplayRecord
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use ekklesia::traits::{fetch_records, EntryQuery, FileSource};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let source = FileSource::new("fixtures/events.json");
//! let records = fetch_records(&source, &EntryQuery::new("event")).await?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

use ekklesia_core::delivery::parse_response;
use ekklesia_core::models::DisplayRecord;
use ekklesia_core::normalize::normalize_batch;

/// Default `include` depth for linked entries and assets.
pub const DEFAULT_INCLUDE: u8 = 2;

/// Default ordering: newest first.
pub const DEFAULT_ORDER: &str = "-sys.createdAt";

// ═══════════════════════════════════════════════════════════════════════
// Query
// ═══════════════════════════════════════════════════════════════════════

/// Parameters for an entries request.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuery {
    pub content_type: Option<String>,
    pub include: u8,
    pub order: String,
    pub limit: Option<usize>,
    /// Extra filters such as `("fields.status", "active")`, in insertion order.
    pub filters: Vec<(String, String)>,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            content_type: None,
            include: DEFAULT_INCLUDE,
            order: DEFAULT_ORDER.to_string(),
            limit: None,
            filters: Vec::new(),
        }
    }
}

impl EntryQuery {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Default::default()
        }
    }

    pub fn include(mut self, depth: u8) -> Self {
        self.include = depth;
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Query-string pairs in the order the delivery API expects them.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(ct) = &self.content_type {
            params.push(("content_type".to_string(), ct.clone()));
        }
        params.push(("include".to_string(), self.include.to_string()));
        params.push(("order".to_string(), self.order.clone()));
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params.extend(self.filters.iter().cloned());
        params
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ContentSource Trait
// ═══════════════════════════════════════════════════════════════════════

/// Something that can answer an entries query with a delivery response.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use ekklesia::traits::{ContentSource, EntryQuery};
/// use serde_json::{json, Value};
///
/// struct Empty;
///
/// #[async_trait]
/// impl ContentSource for Empty {
///     fn name(&self) -> &str { "empty" }
///
///     async fn fetch_entries(&self, _query: &EntryQuery) -> Result<Value> {
///         Ok(json!({ "items": [] }))
///     }
/// }
/// ```
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Fetch the raw response body for `query`.
    async fn fetch_entries(&self, query: &EntryQuery) -> Result<Value>;
}

/// Fetch, parse and normalize one page of entries.
pub async fn fetch_records<S>(source: &S, query: &EntryQuery) -> Result<Vec<DisplayRecord>>
where
    S: ContentSource + ?Sized,
{
    let json = source
        .fetch_entries(query)
        .await
        .with_context(|| format!("content source '{}' failed", source.name()))?;
    let response = parse_response(&json)?;
    tracing::debug!(
        source = source.name(),
        items = response.items.len(),
        "fetched entries"
    );
    Ok(normalize_batch(&response.items, &response.includes))
}

// ═══════════════════════════════════════════════════════════════════════
// FileSource
// ═══════════════════════════════════════════════════════════════════════

/// A delivery response saved to disk.
///
/// The query's content type and limit are applied to `items` so a single
/// export can serve several listings; `includes` are passed through as-is.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContentSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_entries(&self, query: &EntryQuery) -> Result<Value> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let mut json: Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", self.path.display()))?;

        if let Some(items) = json.get_mut("items").and_then(Value::as_array_mut) {
            if let Some(ct) = &query.content_type {
                items.retain(|item| {
                    item.pointer("/sys/contentType/sys/id").and_then(Value::as_str)
                        == Some(ct.as_str())
                });
            }
            if let Some(limit) = query.limit {
                items.truncate(limit);
            }
        }
        Ok(json)
    }
}
