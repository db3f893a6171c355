//! Site search over the static corpus, plus the history commands.
//!
//! [`search_site`] is the application entry point: it records the query in
//! the search history, ranks the configured corpus with
//! [`ekklesia_core::search::rank`], and shapes each hit for display
//! (highlighted title, truncated and highlighted excerpt, long-form date).

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use ekklesia_core::dates::format_long_date;
use ekklesia_core::highlight::{excerpt, highlight_mark};
use ekklesia_core::history::{HistoryEntry, KeyValueStore, SearchHistory};
use ekklesia_core::models::SearchDocument;
use ekklesia_core::search::{rank, FilterState, ScoreExplanation, ScoredResult, SearchRequest};

use crate::config::Config;
use crate::corpus::load_corpus;
use crate::history_store::FileKeyValueStore;

/// One search result, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    /// Title with matches wrapped in `<mark>`.
    pub highlighted_title: String,
    /// Truncated body with matches wrapped in `<mark>`.
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// e.g. `"June 18, 2024"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ScoreExplanation>,
}

/// Options for a site search beyond the query and filters.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub explain: bool,
    pub now: DateTime<Utc>,
}

/// Record `query` in history, then rank `corpus`.
///
/// A blank query returns no hits and leaves the history untouched.
pub fn search_site<S: KeyValueStore>(
    config: &Config,
    corpus: &[SearchDocument],
    history: &SearchHistory<S>,
    query: &str,
    filters: &FilterState,
    opts: SearchOptions,
) -> Result<Vec<SearchHit>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    history.record(query, opts.now)?;

    let req = SearchRequest {
        query,
        filters,
        now: opts.now,
        limit: opts.limit,
        explain: opts.explain,
    };
    let hits = rank(corpus, &req)
        .into_iter()
        .map(|r| to_hit(r, query, config.search.excerpt_chars))
        .collect();
    Ok(hits)
}

fn to_hit(result: ScoredResult<'_>, query: &str, excerpt_chars: usize) -> SearchHit {
    let doc = result.document;
    SearchHit {
        id: doc.id.clone(),
        title: doc.title.clone(),
        highlighted_title: highlight_mark(&doc.title, query),
        excerpt: excerpt(&doc.body, query, excerpt_chars),
        kind_label: doc.kind_label.clone(),
        url: doc.url.clone(),
        author: doc.author.clone(),
        date: doc
            .published_at
            .map(|d| format_long_date(&d.to_rfc3339_opts(SecondsFormat::Secs, true))),
        score: result.score,
        explain: result.explain,
    }
}

/// History backed by the configured JSON file.
pub fn open_history(config: &Config) -> SearchHistory<FileKeyValueStore> {
    SearchHistory::new(FileKeyValueStore::new(&config.search.history_path))
        .with_limit(config.search.history_limit)
}

/// `ekk search`: run a search and print the hits.
pub fn run_search(
    config: &Config,
    query: &str,
    filters: &FilterState,
    limit: Option<usize>,
    explain: bool,
    json: bool,
) -> Result<()> {
    let corpus = load_corpus(config)?;
    let history = open_history(config);
    let opts = SearchOptions {
        limit,
        explain,
        now: Utc::now(),
    };
    let hits = search_site(config, &corpus, &history, query, filters, opts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let noun = if hits.len() == 1 { "result" } else { "results" };
    println!("Found {} {} for \"{}\"", hits.len(), noun, query.trim());
    println!();

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{}] {} / {}",
            i + 1,
            hit.score,
            hit.kind_label.as_deref().unwrap_or("-"),
            hit.title
        );
        if let Some(ref author) = hit.author {
            println!("    author: {}", author);
        }
        if let Some(ref date) = hit.date {
            println!("    date: {}", date);
        }
        if let Some(ref url) = hit.url {
            println!("    url: {}", url);
        }
        println!("    excerpt: \"{}\"", hit.excerpt);
        if let Some(ref ex) = hit.explain {
            println!(
                "    explain: title={} prefix={} body={}x{} author={} tags={}x{} fresh={}",
                ex.title,
                ex.title_prefix,
                ex.body_occurrences,
                ekklesia_core::search::BODY_OCCURRENCE_POINTS,
                ex.author,
                ex.matching_tags,
                ekklesia_core::search::TAG_MATCH_POINTS,
                ex.freshness
            );
        }
        println!("    id: {}", hit.id);
        println!();
    }
    Ok(())
}

fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No search history.");
        return;
    }
    for entry in entries {
        println!("{:<30} {}", entry.query, entry.timestamp);
    }
}

pub fn run_history_list(config: &Config) -> Result<()> {
    print_history(&open_history(config).entries()?);
    Ok(())
}

pub fn run_history_remove(config: &Config, query: &str) -> Result<()> {
    print_history(&open_history(config).remove(query)?);
    Ok(())
}

pub fn run_history_clear(config: &Config) -> Result<()> {
    open_history(config).clear()?;
    println!("Search history cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ekklesia_core::history::memory::InMemoryKeyValueStore;
    use ekklesia_core::search::{CategoryFilter, Recency};

    use crate::corpus::builtin_corpus;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 15, 12, 0, 0).unwrap()
    }

    fn opts() -> SearchOptions {
        SearchOptions {
            limit: None,
            explain: false,
            now: now(),
        }
    }

    #[test]
    fn test_search_prayer_ranks_prayer_meeting_first() {
        let config = Config::minimal();
        let corpus = builtin_corpus().unwrap();
        let history = SearchHistory::new(InMemoryKeyValueStore::new());

        let hits = search_site(
            &config,
            &corpus,
            &history,
            "prayer",
            &FilterState::default(),
            opts(),
        )
        .unwrap();

        assert_eq!(hits[0].id, "event-3");
        assert_eq!(hits[0].highlighted_title, "<mark>Prayer</mark> Meeting");
        assert!(hits[0].excerpt.contains("<mark>prayer</mark>"));
        assert_eq!(hits[0].date.as_deref(), Some("December 13, 2024"));
        assert!(hits.iter().any(|h| h.id == "sermon-4"));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_records_history() {
        let config = Config::minimal();
        let corpus = builtin_corpus().unwrap();
        let history = SearchHistory::new(InMemoryKeyValueStore::new());

        search_site(&config, &corpus, &history, "  youth ", &FilterState::default(), opts())
            .unwrap();
        search_site(&config, &corpus, &history, "", &FilterState::default(), opts()).unwrap();

        let entries = history.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].query, "youth");
    }

    #[test]
    fn test_search_survives_garbage_history_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::minimal();
        config.search.history_path = dir.path().join("history.json");
        std::fs::write(&config.search.history_path, "{not json").unwrap();
        let corpus = builtin_corpus().unwrap();
        let history = open_history(&config);

        let hits =
            search_site(&config, &corpus, &history, "prayer", &FilterState::default(), opts())
                .unwrap();
        assert_eq!(hits[0].id, "event-3");
        assert_eq!(queries_of(&history), vec!["prayer"]);
    }

    fn queries_of<S: KeyValueStore>(history: &SearchHistory<S>) -> Vec<String> {
        history.entries().unwrap().into_iter().map(|e| e.query).collect()
    }

    #[test]
    fn test_hit_markup_is_escaped() {
        let config = Config::minimal();
        let corpus = crate::corpus::parse_corpus(
            r#"[{
                "id": "page-x",
                "title": "Youth <script>alert(1)</script>",
                "content": "Games & worship for youth.",
                "category": "pages",
                "type": "Page",
                "tags": []
            }]"#,
        )
        .unwrap();
        let history = SearchHistory::new(InMemoryKeyValueStore::new());

        let hits =
            search_site(&config, &corpus, &history, "youth", &FilterState::default(), opts())
                .unwrap();
        assert_eq!(
            hits[0].highlighted_title,
            "<mark>Youth</mark> &lt;script&gt;alert(1)&lt;/script&gt;"
        );
        assert_eq!(hits[0].excerpt, "Games &amp; worship for <mark>youth</mark>.");
    }

    #[test]
    fn test_search_with_filters() {
        let config = Config::minimal();
        let corpus = builtin_corpus().unwrap();
        let history = SearchHistory::new(InMemoryKeyValueStore::new());
        let filters = FilterState::new(CategoryFilter::Only("events".into()), Recency::Week);

        let hits = search_site(&config, &corpus, &history, "worship", &filters, opts()).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        // event-1 is 7.5 days old; upcoming events are kept.
        assert!(!ids.contains(&"event-1"));
        assert!(ids.contains(&"event-3"));
        assert!(ids.contains(&"event-4"));
        assert!(ids.contains(&"event-5"));
        assert!(ids.iter().all(|id| id.starts_with("event-")));
    }

    #[test]
    fn test_search_explain_and_limit() {
        let config = Config::minimal();
        let corpus = builtin_corpus().unwrap();
        let history = SearchHistory::new(InMemoryKeyValueStore::new());
        let opts = SearchOptions {
            limit: Some(2),
            explain: true,
            now: now(),
        };

        let hits =
            search_site(&config, &corpus, &history, "faith", &FilterState::default(), opts).unwrap();
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            let ex = hit.explain.as_ref().unwrap();
            assert_eq!(ex.total(), hit.score);
        }
    }
}
