//! Content commands: live listings from Contentful, and offline
//! normalization and rich text rendering of saved responses.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ekklesia_core::delivery::parse_response;
use ekklesia_core::models::{DisplayRecord, IncludesTable};
use ekklesia_core::normalize::normalize_response;
use ekklesia_core::richtext::{render_rich_text, render_rich_text_with, RichTextNode};

use crate::config::Config;
use crate::contentful::{ContentfulClient, DEFAULT_SEARCH_TYPES};

/// The site listings `ekk content` can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Events,
    UpcomingEvents,
    Projects,
    ActiveProjects,
    BlogPosts,
    PublishedBlogPosts,
    FeaturedBlogPosts,
    Sermons,
}

impl ContentKind {
    pub const ALL: [ContentKind; 8] = [
        ContentKind::Events,
        ContentKind::UpcomingEvents,
        ContentKind::Projects,
        ContentKind::ActiveProjects,
        ContentKind::BlogPosts,
        ContentKind::PublishedBlogPosts,
        ContentKind::FeaturedBlogPosts,
        ContentKind::Sermons,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Events => "events",
            ContentKind::UpcomingEvents => "upcoming-events",
            ContentKind::Projects => "projects",
            ContentKind::ActiveProjects => "active-projects",
            ContentKind::BlogPosts => "blog",
            ContentKind::PublishedBlogPosts => "published-blog",
            ContentKind::FeaturedBlogPosts => "featured-blog",
            ContentKind::Sermons => "sermons",
        }
    }

    /// Page size used when `--limit` is not given.
    pub fn default_limit(&self) -> usize {
        match self {
            ContentKind::Events | ContentKind::Projects => 50,
            ContentKind::BlogPosts | ContentKind::Sermons => 20,
            ContentKind::UpcomingEvents
            | ContentKind::ActiveProjects
            | ContentKind::PublishedBlogPosts => 10,
            ContentKind::FeaturedBlogPosts => 3,
        }
    }
}

impl FromStr for ContentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ContentKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = ContentKind::ALL.iter().map(|k| k.as_str()).collect();
                anyhow::anyhow!("Unknown content type: {}. Use one of: {}", s, names.join(", "))
            })
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

async fn fetch_kind(
    client: &ContentfulClient,
    kind: ContentKind,
    limit: usize,
) -> Result<Vec<DisplayRecord>> {
    match kind {
        ContentKind::Events => client.events(limit).await,
        ContentKind::UpcomingEvents => client.upcoming_events(limit, Utc::now()).await,
        ContentKind::Projects => client.projects(limit).await,
        ContentKind::ActiveProjects => client.active_projects(limit).await,
        ContentKind::BlogPosts => client.blog_posts(limit).await,
        ContentKind::PublishedBlogPosts => client.published_blog_posts(limit).await,
        ContentKind::FeaturedBlogPosts => client.featured_blog_posts(limit).await,
        ContentKind::Sermons => client.sermons(limit).await,
    }
}

fn client_for(config: &Config, preview: bool) -> Result<ContentfulClient> {
    let mut cf = config.contentful.clone();
    cf.preview |= preview;
    ContentfulClient::from_config(&cf)
}

/// `ekk content <kind>`.
pub async fn run_content(
    config: &Config,
    kind: ContentKind,
    limit: Option<usize>,
    preview: bool,
    json: bool,
) -> Result<()> {
    let client = client_for(config, preview)?;
    let records = fetch_kind(&client, kind, limit.unwrap_or(kind.default_limit())).await?;
    print_records(&records, json)
}

/// `ekk content search <query>` across the default content types.
pub async fn run_content_search(
    config: &Config,
    query: &str,
    preview: bool,
    json: bool,
) -> Result<()> {
    let client = client_for(config, preview)?;
    let records = client.search_content(query, DEFAULT_SEARCH_TYPES).await?;
    print_records(&records, json)
}

/// `ekk content check`: verify the space and token.
pub async fn run_content_check(config: &Config, preview: bool) -> Result<()> {
    let client = client_for(config, preview)?;
    client.test_connection().await?;
    println!(
        "Contentful connected ({}).",
        if client.is_preview() { "preview" } else { "delivery" }
    );
    Ok(())
}

fn print_records(records: &[DisplayRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No entries.");
        return Ok(());
    }
    for record in records {
        let title = record
            .text("title")
            .or_else(|| record.text("name"))
            .unwrap_or("(untitled)");
        let updated = record
            .updated_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<24} {:<12} {:<10} {}",
            record.id,
            record.content_type_id.as_deref().unwrap_or("-"),
            updated,
            title
        );
        let unresolved = record.unresolved_links().len();
        if unresolved > 0 {
            println!("    unresolved links: {}", unresolved);
        }
    }
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Normalize a saved delivery response to display records.
pub fn normalize_file(path: &Path) -> Result<Vec<DisplayRecord>> {
    let json = read_json(path)?;
    let response = parse_response(&json)?;
    Ok(normalize_response(&response))
}

/// `ekk normalize <response.json>`: print display records as JSON.
pub fn run_normalize(path: &Path) -> Result<()> {
    let records = normalize_file(path)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Render a saved rich text document, optionally resolving embeds through
/// the `includes` of a saved delivery response.
pub fn render_file(path: &Path, includes: Option<&Path>) -> Result<String> {
    let json = read_json(path)?;
    if json.get("nodeType").and_then(Value::as_str) != Some("document") {
        bail!("{} is not a rich text document", path.display());
    }
    let document = RichTextNode::from_value(&json)
        .with_context(|| format!("Invalid rich text in {}", path.display()))?;

    Ok(match includes {
        Some(inc_path) => {
            let table: IncludesTable = parse_response(&read_json(inc_path)?)?.includes;
            render_rich_text_with(&document, &table)
        }
        None => render_rich_text(&document),
    })
}

/// `ekk render <richtext.json>`: print HTML.
pub fn run_render(path: &Path, includes: Option<&Path>) -> Result<()> {
    println!("{}", render_file(path, includes)?);
    Ok(())
}
