//! Rich text document rendering.
//!
//! A rich text document is a tree of nodes. Text leaves carry a value and
//! zero or more formatting marks; block nodes wrap the concatenated
//! rendering of their children in a fixed tag.
//!
//! | Node type | Markup |
//! |-----------|--------|
//! | `paragraph` | `<p>…</p>` |
//! | `heading-1` … `heading-6` | `<h1>…</h1>` … `<h6>…</h6>` |
//! | `unordered-list` / `ordered-list` | `<ul>…</ul>` / `<ol>…</ol>` |
//! | `list-item` | `<li>…</li>` |
//! | `blockquote` | `<blockquote>…</blockquote>` |
//! | `hr` | `<hr>` |
//! | `hyperlink` | `<a href="URI" target="_blank" rel="noopener">…</a>` |
//! | `embedded-asset-block` | `<div class="embedded-asset">[Asset: ID]</div>` |
//! | `embedded-entry-block` | `<div class="embedded-entry">[Entry: ID]</div>` |
//!
//! Unknown node types render only their children. Text values are
//! HTML-escaped, and hyperlink URIs with a script-capable scheme
//! (`javascript:`, `vbscript:`, `data:`) are replaced by `#`.

use serde::Deserialize;

use crate::models::{DisplayAsset, IncludesTable, RawEntry, RawValue};
use crate::normalize::project_asset;

/// One node of a rich text tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextNode {
    pub node_type: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub marks: Vec<Mark>,
    #[serde(default)]
    pub content: Vec<RichTextNode>,
    #[serde(default)]
    pub data: NodeData,
}

/// A formatting mark on a text leaf.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Node payload: hyperlink URI or embedded link target.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub target: Option<serde_json::Value>,
}

impl RichTextNode {
    /// A block node with children.
    pub fn block(node_type: impl Into<String>, content: Vec<RichTextNode>) -> Self {
        Self {
            node_type: node_type.into(),
            content,
            ..Default::default()
        }
    }

    /// A text leaf with the given marks.
    pub fn text(value: impl Into<String>, marks: &[&str]) -> Self {
        Self {
            node_type: "text".to_string(),
            value: Some(value.into()),
            marks: marks
                .iter()
                .map(|m| Mark {
                    kind: m.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Parse a node tree from its JSON form.
    pub fn from_value(value: &serde_json::Value) -> anyhow::Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Id of the embedded link target (`data.target.sys.id`).
    pub fn target_id(&self) -> Option<&str> {
        self.data
            .target
            .as_ref()
            .and_then(|t| t.get("sys"))
            .and_then(|s| s.get("id"))
            .and_then(|id| id.as_str())
    }
}

/// Render a rich text document (the children of its root) to markup.
///
/// Embedded assets and entries render as placeholders carrying their id.
pub fn render_rich_text(document: &RichTextNode) -> String {
    Renderer { includes: None }.nodes(&document.content)
}

/// Render a rich text document, resolving embedded assets and entries
/// through `includes`. Targets missing from the table keep the placeholder.
pub fn render_rich_text_with(document: &RichTextNode, includes: &IncludesTable) -> String {
    Renderer {
        includes: Some(includes),
    }
    .nodes(&document.content)
}

struct Renderer<'a> {
    includes: Option<&'a IncludesTable>,
}

impl Renderer<'_> {
    fn nodes(&self, nodes: &[RichTextNode]) -> String {
        nodes.iter().map(|n| self.node(n)).collect()
    }

    fn node(&self, node: &RichTextNode) -> String {
        if node.node_type == "text" {
            return render_text(node);
        }

        let content = self.nodes(&node.content);
        match node.node_type.as_str() {
            "paragraph" => wrap("p", &content),
            "heading-1" => wrap("h1", &content),
            "heading-2" => wrap("h2", &content),
            "heading-3" => wrap("h3", &content),
            "heading-4" => wrap("h4", &content),
            "heading-5" => wrap("h5", &content),
            "heading-6" => wrap("h6", &content),
            "unordered-list" => wrap("ul", &content),
            "ordered-list" => wrap("ol", &content),
            "list-item" => wrap("li", &content),
            "blockquote" => wrap("blockquote", &content),
            "hr" => "<hr>".to_string(),
            "hyperlink" => {
                let uri = sanitize_uri(node.data.uri.as_deref().unwrap_or("#"));
                format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                    escape_html(&uri),
                    content
                )
            }
            "embedded-asset-block" => self.embedded_asset(node),
            "embedded-entry-block" => self.embedded_entry(node),
            _ => content,
        }
    }

    fn embedded_asset(&self, node: &RichTextNode) -> String {
        let id = node.target_id().unwrap_or_default();
        let asset = self
            .includes
            .and_then(|inc| inc.asset(id))
            .map(project_asset);
        match asset {
            Some(asset) if asset.url.is_some() => render_asset(&asset),
            _ => format!(
                "<div class=\"embedded-asset\">[Asset: {}]</div>",
                escape_html(id)
            ),
        }
    }

    fn embedded_entry(&self, node: &RichTextNode) -> String {
        let id = node.target_id().unwrap_or_default();
        match self.includes.and_then(|inc| inc.entry(id)) {
            Some(entry) => render_entry(entry),
            None => format!(
                "<div class=\"embedded-entry\">[Entry: {}]</div>",
                escape_html(id)
            ),
        }
    }
}

fn render_text(node: &RichTextNode) -> String {
    let mut text = escape_html(node.value.as_deref().unwrap_or_default());
    for mark in &node.marks {
        text = match mark.kind.as_str() {
            "bold" => wrap("strong", &text),
            "italic" => wrap("em", &text),
            "underline" => wrap("u", &text),
            "code" => wrap("code", &text),
            _ => text,
        };
    }
    text
}

fn render_asset(asset: &DisplayAsset) -> String {
    let url = escape_html(asset.url.as_deref().unwrap_or_default());
    let label = escape_html(asset.title.as_deref().unwrap_or(&asset.id));
    if asset.is_image() {
        format!(
            "<div class=\"embedded-asset\"><img src=\"{}\" alt=\"{}\"></div>",
            url, label
        )
    } else {
        format!(
            "<div class=\"embedded-asset\"><a href=\"{}\">{}</a></div>",
            url, label
        )
    }
}

fn render_entry(entry: &RawEntry) -> String {
    let label = match entry.fields.get("title") {
        Some(RawValue::Literal(serde_json::Value::String(title))) => escape_html(title),
        _ => format!("[Entry: {}]", escape_html(&entry.id)),
    };
    format!(
        "<div class=\"embedded-entry\" data-content-type=\"{}\">{}</div>",
        escape_html(entry.content_type_id.as_deref().unwrap_or_default()),
        label
    )
}

fn wrap(tag: &str, content: &str) -> String {
    format!("<{tag}>{content}</{tag}>")
}

/// Escape text for use in element content or a quoted attribute.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace URIs with a script-capable scheme by `#`. Other URIs pass through.
pub fn sanitize_uri(uri: &str) -> String {
    let compact: String = uri
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();
    const BLOCKED: [&str; 3] = ["javascript:", "vbscript:", "data:"];
    if compact.is_empty() || BLOCKED.iter().any(|s| compact.starts_with(s)) {
        "#".to_string()
    } else {
        uri.trim().to_string()
    }
}
