//! Parsing of content-delivery API responses into raw content graph types.
//!
//! A batch response has the shape:
//!
//! ```text
//! {
//!   "items":    [ <entry>, ... ],
//!   "includes": { "Asset": [ <asset>, ... ], "Entry": [ <entry>, ... ] },
//!   "total": 12, "skip": 0, "limit": 10
//! }
//! ```
//!
//! Entries carry system metadata under `sys` and content under `fields`.
//! A field value is a link iff it is an object whose `sys.type` is `"Link"`
//! and whose `sys.linkType` is `"Asset"` or `"Entry"`. Everything else is a
//! literal, and arrays are parsed element-wise.

use anyhow::{Context, Result};
use serde_json::Value;

use crate::dates::parse_date;
use crate::models::{FieldMap, IncludesTable, LinkKind, RawAsset, RawEntry, RawLink, RawValue};

/// A parsed batch response.
#[derive(Debug, Clone, Default)]
pub struct DeliveryResponse {
    pub items: Vec<RawEntry>,
    pub includes: IncludesTable,
    pub total: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Parse a batch response. A response without `items` yields an empty batch.
pub fn parse_response(json: &Value) -> Result<DeliveryResponse> {
    let items = match json.get("items").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_entry(item).with_context(|| format!("items[{}]", i)))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let mut includes = IncludesTable::new();
    if let Some(inc) = json.get("includes") {
        if let Some(assets) = inc.get("Asset").and_then(Value::as_array) {
            for (i, a) in assets.iter().enumerate() {
                let asset = parse_asset(a).with_context(|| format!("includes.Asset[{}]", i))?;
                includes.insert_asset(asset);
            }
        }
        if let Some(entries) = inc.get("Entry").and_then(Value::as_array) {
            for (i, e) in entries.iter().enumerate() {
                let entry = parse_entry(e).with_context(|| format!("includes.Entry[{}]", i))?;
                includes.insert_entry(entry);
            }
        }
    }

    Ok(DeliveryResponse {
        items,
        includes,
        total: json.get("total").and_then(Value::as_u64),
        skip: json.get("skip").and_then(Value::as_u64),
        limit: json.get("limit").and_then(Value::as_u64),
    })
}

/// Parse a single entry object.
pub fn parse_entry(json: &Value) -> Result<RawEntry> {
    let sys = json
        .get("sys")
        .ok_or_else(|| anyhow::anyhow!("entry is missing sys"))?;
    let id = sys_id(sys).ok_or_else(|| anyhow::anyhow!("entry is missing sys.id"))?;

    let content_type_id = sys
        .get("contentType")
        .and_then(|ct| ct.get("sys"))
        .and_then(sys_id);

    let mut fields = FieldMap::new();
    if let Some(obj) = json.get("fields").and_then(Value::as_object) {
        for (name, value) in obj {
            fields.insert(name.clone(), parse_field_value(value));
        }
    }

    Ok(RawEntry {
        id,
        created_at: sys.get("createdAt").and_then(Value::as_str).and_then(parse_date),
        updated_at: sys.get("updatedAt").and_then(Value::as_str).and_then(parse_date),
        content_type_id,
        fields,
    })
}

/// Parse a single asset object.
pub fn parse_asset(json: &Value) -> Result<RawAsset> {
    let id = json
        .get("sys")
        .and_then(sys_id)
        .ok_or_else(|| anyhow::anyhow!("asset is missing sys.id"))?;

    let fields = json.get("fields");
    let text = |name: &str| {
        fields
            .and_then(|f| f.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let file = fields.and_then(|f| f.get("file"));
    let details = file.and_then(|f| f.get("details"));
    let image = details.and_then(|d| d.get("image"));
    let dimension = |name: &str| {
        image
            .and_then(|i| i.get(name))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };

    Ok(RawAsset {
        id,
        title: text("title"),
        description: text("description"),
        file_url: file
            .and_then(|f| f.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string),
        mime_type: file
            .and_then(|f| f.get("contentType"))
            .and_then(Value::as_str)
            .map(str::to_string),
        size_bytes: details.and_then(|d| d.get("size")).and_then(Value::as_u64),
        width: dimension("width"),
        height: dimension("height"),
    })
}

/// Classify a field value as literal, link, or list.
pub fn parse_field_value(value: &Value) -> RawValue {
    if let Some(link) = as_link(value) {
        return RawValue::Link(link);
    }
    match value {
        Value::Array(items) => RawValue::List(items.iter().map(parse_field_value).collect()),
        other => RawValue::Literal(other.clone()),
    }
}

/// Recognize a link object: `{"sys": {"type": "Link", "linkType": ..., "id": ...}}`.
///
/// An `Asset` or `Entry` link without an id is still a link; its id is empty
/// and it never resolves.
pub fn as_link(value: &Value) -> Option<RawLink> {
    let sys = value.get("sys")?;
    if sys.get("type").and_then(Value::as_str) != Some("Link") {
        return None;
    }
    let kind = match sys.get("linkType").and_then(Value::as_str)? {
        "Asset" => LinkKind::Asset,
        "Entry" => LinkKind::Entry,
        _ => return None,
    };
    let id = sys_id(sys).unwrap_or_default();
    Some(RawLink { kind, id })
}

fn sys_id(sys: &Value) -> Option<String> {
    sys.get("id").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> Value {
        json!({
            "total": 1, "skip": 0, "limit": 10,
            "items": [{
                "sys": {
                    "id": "evt-1",
                    "type": "Entry",
                    "createdAt": "2024-11-01T09:00:00Z",
                    "updatedAt": "2024-11-02T09:00:00Z",
                    "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "event"}}
                },
                "fields": {
                    "title": "Prayer Meeting",
                    "cover": {"sys": {"type": "Link", "linkType": "Asset", "id": "img-1"}},
                    "speakers": [
                        {"sys": {"type": "Link", "linkType": "Entry", "id": "person-1"}},
                        "Guest choir"
                    ]
                }
            }],
            "includes": {
                "Asset": [{
                    "sys": {"id": "img-1", "type": "Asset"},
                    "fields": {
                        "title": "Sanctuary",
                        "file": {
                            "url": "//images.ctfassets.net/space/img-1/sanctuary.jpg",
                            "contentType": "image/jpeg",
                            "details": {"size": 52311, "image": {"width": 1200, "height": 800}}
                        }
                    }
                }],
                "Entry": [{
                    "sys": {"id": "person-1", "type": "Entry",
                            "contentType": {"sys": {"id": "person"}}},
                    "fields": {"name": "Pastor Emmanuel"}
                }]
            }
        })
    }

    #[test]
    fn test_parse_batch() {
        let resp = parse_response(&sample_response()).unwrap();
        assert_eq!(resp.items.len(), 1);
        assert_eq!(resp.total, Some(1));

        let entry = &resp.items[0];
        assert_eq!(entry.id, "evt-1");
        assert_eq!(entry.content_type_id.as_deref(), Some("event"));
        assert!(entry.created_at.is_some());
        assert_eq!(
            entry.fields.get("cover"),
            Some(&RawValue::Link(RawLink::asset("img-1")))
        );
        match entry.fields.get("speakers") {
            Some(RawValue::List(items)) => {
                assert_eq!(items[0], RawValue::Link(RawLink::entry("person-1")));
                assert_eq!(items[1], RawValue::Literal(json!("Guest choir")));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_includes() {
        let resp = parse_response(&sample_response()).unwrap();
        let asset = resp.includes.asset("img-1").unwrap();
        assert_eq!(asset.width, Some(1200));
        assert_eq!(asset.size_bytes, Some(52311));
        assert_eq!(asset.mime_type.as_deref(), Some("image/jpeg"));
        assert!(resp.includes.entry("person-1").is_some());
    }

    #[test]
    fn test_missing_items_is_empty_batch() {
        let resp = parse_response(&json!({"sys": {"type": "Error"}})).unwrap();
        assert!(resp.items.is_empty());
        assert!(resp.includes.is_empty());
    }

    #[test]
    fn test_entry_without_fields() {
        let entry = parse_entry(&json!({"sys": {"id": "bare"}})).unwrap();
        assert!(entry.fields.is_empty());
        assert!(entry.content_type_id.is_none());
    }

    #[test]
    fn test_entry_without_id_is_error() {
        let err = parse_response(&json!({"items": [{"sys": {}}]})).unwrap_err();
        assert!(format!("{:#}", err).contains("items[0]"));
    }

    #[test]
    fn test_link_without_id_is_still_a_link() {
        let v = json!({"sys": {"type": "Link", "linkType": "Entry"}});
        assert_eq!(
            parse_field_value(&v),
            RawValue::Link(RawLink {
                kind: LinkKind::Entry,
                id: String::new()
            })
        );
    }

    #[test]
    fn test_non_link_sys_object_is_literal() {
        let v = json!({"sys": {"type": "Link", "linkType": "Space", "id": "s"}});
        assert_eq!(parse_field_value(&v), RawValue::Literal(v.clone()));
    }
}
