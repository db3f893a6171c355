//! Integration tests for the `ContentSource` extension point.
//!
//! These tests prove that custom sources (implemented via the trait) and the
//! built-in `FileSource` flow through `fetch_records` into fully resolved
//! display records.

use anyhow::{bail, Result};
use async_trait::async_trait;
use ekklesia::traits::{fetch_records, ContentSource, EntryQuery, FileSource};
use serde_json::{json, Value};
use std::sync::Mutex;
use tempfile::TempDir;

// ─── Test Source ────────────────────────────────────────────────────

/// Serves a fixed response and remembers the queries it was asked.
struct InMemorySource {
    response: Value,
    seen: Mutex<Vec<EntryQuery>>,
}

impl InMemorySource {
    fn new(response: Value) -> Self {
        Self {
            response,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContentSource for InMemorySource {
    fn name(&self) -> &str {
        "inmemory"
    }

    async fn fetch_entries(&self, query: &EntryQuery) -> Result<Value> {
        self.seen.lock().unwrap().push(query.clone());
        Ok(self.response.clone())
    }
}

/// Always fails, to check error context.
struct BrokenSource;

#[async_trait]
impl ContentSource for BrokenSource {
    fn name(&self) -> &str {
        "broken"
    }

    async fn fetch_entries(&self, _query: &EntryQuery) -> Result<Value> {
        bail!("connection refused")
    }
}

fn link(kind: &str, id: &str) -> Value {
    json!({ "sys": { "type": "Link", "linkType": kind, "id": id } })
}

fn entry(id: &str, content_type: &str, fields: Value) -> Value {
    json!({
        "sys": {
            "id": id,
            "contentType": { "sys": { "type": "Link", "linkType": "ContentType", "id": content_type } }
        },
        "fields": fields
    })
}

fn events_response() -> Value {
    json!({
        "items": [
            entry("ev-1", "event", json!({
                "title": "Youth Camp 2025",
                "location": link("Entry", "venue-1"),
                "poster": link("Asset", "poster-1")
            })),
            entry("ev-2", "event", json!({
                "title": "Christmas Concert",
                "location": link("Entry", "venue-1")
            })),
            entry("post-1", "blogPost", json!({ "title": "Not an event" }))
        ],
        "includes": {
            "Entry": [entry("venue-1", "venue", json!({ "name": "Main Sanctuary" }))],
            "Asset": [{
                "sys": { "id": "poster-1" },
                "fields": { "title": "Camp poster", "file": { "url": "//cdn/poster.png", "contentType": "image/png" } }
            }]
        }
    })
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_custom_source_records_are_resolved() {
    let source = InMemorySource::new(events_response());
    let records = fetch_records(&source, &EntryQuery::new("event").limit(10))
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].id, "ev-1");

    let venue = records[0].field("location").unwrap().as_record().unwrap();
    assert_eq!(venue.text("name"), Some("Main Sanctuary"));

    let poster = records[0].field("poster").unwrap().as_asset().unwrap();
    assert_eq!(poster.url.as_deref(), Some("https://cdn/poster.png"));
    assert!(poster.is_image());

    // Shared target resolves identically for both referrers
    assert_eq!(
        records[0].field("location"),
        records[1].field("location")
    );

    let seen = source.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].content_type.as_deref(), Some("event"));
    assert_eq!(seen[0].limit, Some(10));
}

#[tokio::test]
async fn test_source_errors_carry_source_name() {
    let err = fetch_records(&BrokenSource, &EntryQuery::new("event"))
        .await
        .unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("broken"));
    assert!(msg.contains("connection refused"));
}

#[tokio::test]
async fn test_malformed_item_is_an_error() {
    let source = InMemorySource::new(json!({ "items": [{ "fields": {} }] }));
    let err = fetch_records(&source, &EntryQuery::new("event"))
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("items[0]"));
}

#[tokio::test]
async fn test_file_source_filters_by_content_type() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("export.json");
    std::fs::write(&path, serde_json::to_string(&events_response()).unwrap()).unwrap();

    let source = FileSource::new(&path);
    let events = fetch_records(&source, &EntryQuery::new("event")).await.unwrap();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|r| r.content_type_id.as_deref() == Some("event")));

    let one = fetch_records(&source, &EntryQuery::new("event").limit(1))
        .await
        .unwrap();
    assert_eq!(one.len(), 1);

    let posts = fetch_records(&source, &EntryQuery::new("blogPost")).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text("title"), Some("Not an event"));
}

#[tokio::test]
async fn test_trait_object_source() {
    let sources: Vec<Box<dyn ContentSource>> = vec![
        Box::new(InMemorySource::new(json!({ "items": [] }))),
        Box::new(InMemorySource::new(events_response())),
    ];
    let mut total = 0;
    for source in &sources {
        total += fetch_records(source.as_ref(), &EntryQuery::default())
            .await
            .unwrap()
            .len();
    }
    assert_eq!(total, 3);
}
