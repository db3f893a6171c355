//! Query highlighting and excerpt truncation for result rendering.
//!
//! The query is always escaped with [`regex::escape`] before it reaches the
//! pattern engine, so characters such as `.`, `+`, `(` or `[` match
//! themselves and a malformed pattern can never be built from user input.
//!
//! Output is HTML: the text around and inside each match is escaped with
//! [`escape_html`], and only the marker strings are emitted verbatim.

use regex::RegexBuilder;

use crate::richtext::escape_html;

/// Default excerpt length in characters.
pub const EXCERPT_CHARS: usize = 150;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

/// Wrap every case-insensitive literal occurrence of `query` in
/// `open`/`close`, preserving the casing of the matched text.
///
/// A blank query returns the escaped text with no markers.
pub fn highlight(text: &str, query: &str, open: &str, close: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return escape_html(text);
    }

    let re = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            // Only reachable if the escaped pattern exceeds the size limit.
            tracing::warn!(error = %e, "highlight pattern rejected");
            return escape_html(text);
        }
    };

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        out.push_str(open);
        out.push_str(&escape_html(m.as_str()));
        out.push_str(close);
        last = m.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// [`highlight`] with `<mark>` tags.
pub fn highlight_mark(text: &str, query: &str) -> String {
    highlight(text, query, MARK_OPEN, MARK_CLOSE)
}

/// Keep the first `max_chars` characters, appending `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}

/// Truncated, highlighted body excerpt. Truncation counts characters of the
/// unescaped text.
pub fn excerpt(body: &str, query: &str, max_chars: usize) -> String {
    highlight_mark(&truncate_text(body, max_chars), query)
}
