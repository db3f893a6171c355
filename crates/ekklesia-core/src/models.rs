//! Core data models shared by the normalizer, ranker, and renderers.
//!
//! Two families of types live here:
//!
//! - **Content graph**: [`RawEntry`], [`RawAsset`], and [`RawLink`] as they
//!   arrive from a delivery API, the [`IncludesTable`] used to resolve links,
//!   and the flattened [`DisplayRecord`] / [`DisplayAsset`] produced by
//!   [`normalize`](crate::normalize::normalize).
//! - **Search corpus**: [`SearchDocument`], the unit the ranker scores.
//!
//! Field sets vary per content type and are not known ahead of time, so
//! entry fields are an insertion-ordered map from field name to a tagged
//! value rather than a typed struct.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Insertion-ordered field map keyed by content-type field name.
pub type FieldMap<V> = IndexMap<String, V>;

// ═══════════════════════════════════════════════════════════════════════
// Raw content graph
// ═══════════════════════════════════════════════════════════════════════

/// The kind of target a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    Asset,
    Entry,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Asset => "Asset",
            LinkKind::Entry => "Entry",
        }
    }
}

/// A reference to an asset or entry by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawLink {
    pub kind: LinkKind,
    pub id: String,
}

impl RawLink {
    pub fn asset(id: impl Into<String>) -> Self {
        Self {
            kind: LinkKind::Asset,
            id: id.into(),
        }
    }

    pub fn entry(id: impl Into<String>) -> Self {
        Self {
            kind: LinkKind::Entry,
            id: id.into(),
        }
    }
}

/// A field value as received: a literal, a link, or a sequence of either.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Literal(serde_json::Value),
    Link(RawLink),
    List(Vec<RawValue>),
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        RawValue::Literal(value)
    }
}

impl From<RawLink> for RawValue {
    fn from(link: RawLink) -> Self {
        RawValue::Link(link)
    }
}

/// A structured content item with system metadata and typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub content_type_id: Option<String>,
    pub fields: FieldMap<RawValue>,
}

impl RawEntry {
    /// An entry with no timestamps and no fields.
    pub fn new(id: impl Into<String>, content_type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: None,
            updated_at: None,
            content_type_id: Some(content_type_id.into()),
            fields: FieldMap::new(),
        }
    }

    /// Builder-style helper to add a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A binary resource (image or file) with its file metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAsset {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Stored file URL, usually protocol-relative (`//images.example.net/...`).
    pub file_url: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Side table of link targets that accompanies a batch response.
///
/// Built once per response and only read during normalization. When the
/// same id appears twice, the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct IncludesTable {
    pub assets_by_id: HashMap<String, RawAsset>,
    pub entries_by_id: HashMap<String, RawEntry>,
}

impl IncludesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        assets: impl IntoIterator<Item = RawAsset>,
        entries: impl IntoIterator<Item = RawEntry>,
    ) -> Self {
        let mut table = Self::new();
        for asset in assets {
            table.insert_asset(asset);
        }
        for entry in entries {
            table.insert_entry(entry);
        }
        table
    }

    pub fn insert_asset(&mut self, asset: RawAsset) {
        self.assets_by_id.entry(asset.id.clone()).or_insert(asset);
    }

    pub fn insert_entry(&mut self, entry: RawEntry) {
        self.entries_by_id.entry(entry.id.clone()).or_insert(entry);
    }

    pub fn asset(&self, id: &str) -> Option<&RawAsset> {
        self.assets_by_id.get(id)
    }

    pub fn entry(&self, id: &str) -> Option<&RawEntry> {
        self.entries_by_id.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.assets_by_id.is_empty() && self.entries_by_id.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Normalized output
// ═══════════════════════════════════════════════════════════════════════

/// Asset metadata projected for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayAsset {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Absolute URL, or `None` when the asset has no file.
    pub url: Option<String>,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl DisplayAsset {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
    }
}

/// A link whose target was absent from the includes table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedLink {
    pub link_type: LinkKind,
    pub id: String,
}

/// A normalized field value. Never holds a raw link.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Literal(serde_json::Value),
    Asset(DisplayAsset),
    Entry(Box<DisplayRecord>),
    List(Vec<DisplayValue>),
    Unresolved(UnresolvedLink),
}

impl DisplayValue {
    pub fn as_literal(&self) -> Option<&serde_json::Value> {
        match self {
            DisplayValue::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(|v| v.as_str())
    }

    pub fn as_asset(&self) -> Option<&DisplayAsset> {
        match self {
            DisplayValue::Asset(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&DisplayRecord> {
        match self {
            DisplayValue::Entry(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DisplayValue]> {
        match self {
            DisplayValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, DisplayValue::Unresolved(_))
    }

    fn collect_unresolved<'a>(&'a self, out: &mut Vec<&'a UnresolvedLink>) {
        match self {
            DisplayValue::Unresolved(link) => out.push(link),
            DisplayValue::Entry(record) => {
                for value in record.fields.values() {
                    value.collect_unresolved(out);
                }
            }
            DisplayValue::List(items) => {
                for item in items {
                    item.collect_unresolved(out);
                }
            }
            DisplayValue::Literal(_) | DisplayValue::Asset(_) => {}
        }
    }
}

impl Serialize for DisplayValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DisplayValue::Literal(v) => v.serialize(serializer),
            DisplayValue::Asset(a) => a.serialize(serializer),
            DisplayValue::Entry(r) => r.serialize(serializer),
            DisplayValue::List(items) => items.serialize(serializer),
            DisplayValue::Unresolved(link) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("unresolved", link)?;
                map.end()
            }
        }
    }
}

/// A flattened entry ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "contentType")]
    pub content_type_id: Option<String>,
    pub fields: FieldMap<DisplayValue>,
}

impl DisplayRecord {
    pub fn field(&self, name: &str) -> Option<&DisplayValue> {
        self.fields.get(name)
    }

    /// String value of a literal field, if present.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(DisplayValue::as_str)
    }

    /// Every unresolved link reachable from this record, depth first.
    pub fn unresolved_links(&self) -> Vec<&UnresolvedLink> {
        let mut out = Vec::new();
        for value in self.fields.values() {
            value.collect_unresolved(&mut out);
        }
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Search corpus
// ═══════════════════════════════════════════════════════════════════════

/// A searchable document in the site corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub title: String,
    #[serde(alias = "content")]
    pub body: String,
    pub category: String,
    /// Display label such as `"Sermon"` or `"Weekly Event"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(
        rename = "date",
        default,
        deserialize_with = "crate::dates::deserialize_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl SearchDocument {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            category: category.into(),
            kind_label: None,
            url: None,
            author: None,
            published_at: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_includes_first_occurrence_wins() {
        let mut first = RawAsset {
            id: "a1".into(),
            ..Default::default()
        };
        first.title = Some("first".into());
        let mut second = first.clone();
        second.title = Some("second".into());

        let table = IncludesTable::from_parts(vec![first, second], vec![]);
        assert_eq!(table.asset("a1").unwrap().title.as_deref(), Some("first"));
    }

    #[test]
    fn test_unresolved_serializes_as_tagged_object() {
        let value = DisplayValue::Unresolved(UnresolvedLink {
            link_type: LinkKind::Entry,
            id: "missing".into(),
        });
        let out = serde_json::to_value(&value).unwrap();
        assert_eq!(
            out,
            json!({"unresolved": {"linkType": "Entry", "id": "missing"}})
        );
    }

    #[test]
    fn test_search_document_from_site_json() {
        let doc: SearchDocument = serde_json::from_value(json!({
            "id": "sermon-1",
            "title": "Walking in the Spirit",
            "content": "Exploring what it means...",
            "category": "sermons",
            "type": "Sermon",
            "author": "Pastor Emmanuel",
            "date": "2024-06-18",
            "tags": ["holy spirit", "faith"]
        }))
        .unwrap();

        assert_eq!(doc.kind_label.as_deref(), Some("Sermon"));
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(
            doc.published_at.unwrap().format("%Y-%m-%d").to_string(),
            "2024-06-18"
        );
    }

    #[test]
    fn test_search_document_without_date_or_author() {
        let doc: SearchDocument = serde_json::from_value(json!({
            "id": "page-1",
            "title": "About Our Church",
            "body": "History and mission.",
            "category": "pages"
        }))
        .unwrap();
        assert!(doc.published_at.is_none());
        assert!(doc.author.is_none());
        assert!(doc.tags.is_empty());
    }
}
