//! Link-graph normalization: raw entries in, flat display records out.
//!
//! Every link field is replaced by its target from the [`IncludesTable`]:
//! asset links become [`DisplayAsset`]s, entry links become recursively
//! normalized [`DisplayRecord`]s, and links whose target is missing become
//! [`DisplayValue::Unresolved`]. Lists are mapped element-wise, so their
//! length and order never change.
//!
//! # Cycles
//!
//! Entry links may form cycles (`A → B → A`). The resolver tracks the ids on
//! the active resolution path; a link back to one of them is replaced by a
//! stub record carrying only the target's system metadata (id, timestamps,
//! content type) and no fields. Resolution therefore terminates for any
//! graph shape.
//!
//! # Example
//!
//! ```rust
//! use ekklesia_core::models::{IncludesTable, RawEntry, RawLink};
//! use ekklesia_core::normalize::normalize;
//!
//! let entry = RawEntry::new("post-1", "blogPost")
//!     .with_field("title", serde_json::json!("Advent"))
//!     .with_field("author", RawLink::entry("nobody"));
//!
//! let record = normalize(&entry, &IncludesTable::new());
//! assert_eq!(record.text("title"), Some("Advent"));
//! assert!(record.field("author").unwrap().is_unresolved());
//! ```

use std::collections::HashSet;

use crate::delivery::DeliveryResponse;
use crate::models::{
    DisplayAsset, DisplayRecord, DisplayValue, FieldMap, IncludesTable, LinkKind, RawAsset,
    RawEntry, RawLink, RawValue, UnresolvedLink,
};

/// Normalize one entry against an includes table.
pub fn normalize(entry: &RawEntry, includes: &IncludesTable) -> DisplayRecord {
    Resolver::new(includes).entry(entry)
}

/// Normalize a batch of entries, preserving input order.
///
/// Entries are independent of one another; each gets its own resolution path.
pub fn normalize_batch(entries: &[RawEntry], includes: &IncludesTable) -> Vec<DisplayRecord> {
    entries.iter().map(|e| normalize(e, includes)).collect()
}

/// Normalize every item of a parsed delivery response.
pub fn normalize_response(response: &DeliveryResponse) -> Vec<DisplayRecord> {
    normalize_batch(&response.items, &response.includes)
}

/// Project an asset's file metadata for display.
pub fn project_asset(asset: &RawAsset) -> DisplayAsset {
    DisplayAsset {
        id: asset.id.clone(),
        title: asset.title.clone(),
        description: asset.description.clone(),
        url: asset.file_url.as_deref().and_then(absolute_url),
        mime_type: asset.mime_type.clone(),
        size_bytes: asset.size_bytes,
        width: asset.width,
        height: asset.height,
    }
}

/// Stored file URLs are protocol-relative; give them an `https:` scheme.
/// URLs that already carry a scheme pass through.
fn absolute_url(stored: &str) -> Option<String> {
    let stored = stored.trim();
    if stored.is_empty() {
        None
    } else if stored.starts_with("//") {
        Some(format!("https:{}", stored))
    } else {
        Some(stored.to_string())
    }
}

struct Resolver<'a> {
    includes: &'a IncludesTable,
    in_progress: HashSet<String>,
}

impl<'a> Resolver<'a> {
    fn new(includes: &'a IncludesTable) -> Self {
        Self {
            includes,
            in_progress: HashSet::new(),
        }
    }

    fn entry(&mut self, entry: &RawEntry) -> DisplayRecord {
        self.in_progress.insert(entry.id.clone());
        let fields: FieldMap<DisplayValue> = entry
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), self.value(value)))
            .collect();
        self.in_progress.remove(&entry.id);

        DisplayRecord {
            id: entry.id.clone(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
            content_type_id: entry.content_type_id.clone(),
            fields,
        }
    }

    fn value(&mut self, value: &RawValue) -> DisplayValue {
        match value {
            RawValue::Literal(v) => DisplayValue::Literal(v.clone()),
            RawValue::Link(link) => self.link(link),
            RawValue::List(items) => DisplayValue::List(items.iter().map(|v| self.value(v)).collect()),
        }
    }

    fn link(&mut self, link: &RawLink) -> DisplayValue {
        if link.id.is_empty() {
            return unresolved(link);
        }
        let includes = self.includes;
        match link.kind {
            LinkKind::Asset => match includes.asset(&link.id) {
                Some(asset) => DisplayValue::Asset(project_asset(asset)),
                None => unresolved(link),
            },
            LinkKind::Entry => match includes.entry(&link.id) {
                None => unresolved(link),
                Some(target) if self.in_progress.contains(&target.id) => {
                    tracing::debug!(id = %target.id, "entry link cycle, substituting stub");
                    DisplayValue::Entry(Box::new(stub(target)))
                }
                Some(target) => DisplayValue::Entry(Box::new(self.entry(target))),
            },
        }
    }
}

fn unresolved(link: &RawLink) -> DisplayValue {
    tracing::debug!(kind = link.kind.as_str(), id = %link.id, "unresolved link");
    DisplayValue::Unresolved(UnresolvedLink {
        link_type: link.kind,
        id: link.id.clone(),
    })
}

fn stub(entry: &RawEntry) -> DisplayRecord {
    DisplayRecord {
        id: entry.id.clone(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        content_type_id: entry.content_type_id.clone(),
        fields: FieldMap::new(),
    }
}
