//! Relevance ranking over an in-memory document corpus.
//!
//! The ranker filters, scores, and orders [`SearchDocument`]s against a
//! free-text query. It reads the corpus and never mutates it; callers own
//! both the corpus and the clock, so results are a pure function of the
//! [`SearchRequest`].
//!
//! # Algorithm
//!
//! 1. Lowercase and trim the query. A blank query yields no results.
//! 2. Keep documents whose title, body, author, or any tag contains the
//!    query as a literal substring, and that pass the category and recency
//!    filters. Undated documents always pass the recency filter.
//! 3. Score each survivor (all weights are exact integers):
//!    - `+10` title contains the query, `+5` more if the title starts with it
//!    - `+2` per non-overlapping occurrence in the body
//!    - `+3` author contains the query
//!    - `+4` per tag containing the query
//!    - `+1` published less than 30 days before `now`
//! 4. Sort by score descending. The sort is stable: equal scores keep
//!    corpus order.
//! 5. Truncate to `limit`, if given.
//!
//! The freshness boost in step 3 is a constant window and does not follow
//! the recency filter selection.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::days_between;
use crate::models::SearchDocument;

pub const TITLE_MATCH_POINTS: u32 = 10;
pub const TITLE_PREFIX_POINTS: u32 = 5;
pub const BODY_OCCURRENCE_POINTS: u32 = 2;
pub const AUTHOR_MATCH_POINTS: u32 = 3;
pub const TAG_MATCH_POINTS: u32 = 4;
pub const FRESHNESS_POINTS: u32 = 1;
/// Documents published less than this many days ago get [`FRESHNESS_POINTS`].
pub const FRESHNESS_WINDOW_DAYS: f64 = 30.0;

/// Category selection: everything, or one named category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("category must not be empty; use \"all\" for no filter");
        }
        if s.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(s.to_string()))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(c) => f.write_str(c),
        }
    }
}

/// Recency window relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recency {
    #[default]
    All,
    Week,
    Month,
    Year,
}

impl Recency {
    /// Maximum document age in days, or `None` for no limit.
    pub fn max_days(&self) -> Option<f64> {
        match self {
            Recency::All => None,
            Recency::Week => Some(7.0),
            Recency::Month => Some(30.0),
            Recency::Year => Some(365.0),
        }
    }
}

impl FromStr for Recency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Recency::All),
            "week" => Ok(Recency::Week),
            "month" => Ok(Recency::Month),
            "year" => Ok(Recency::Year),
            other => bail!(
                "Unknown recency filter: {}. Use all, week, month, or year.",
                other
            ),
        }
    }
}

impl fmt::Display for Recency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recency::All => "all",
            Recency::Week => "week",
            Recency::Month => "month",
            Recency::Year => "year",
        })
    }
}

/// User-selected filters, owned by the UI and read per search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub category: CategoryFilter,
    pub recency: Recency,
}

impl FilterState {
    pub fn new(category: CategoryFilter, recency: Recency) -> Self {
        Self { category, recency }
    }
}

/// Bundles all inputs for a single ranking call.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    /// Free-text query, matched literally and case-insensitively.
    pub query: &'a str,
    pub filters: &'a FilterState,
    /// Reference time for the recency filter and freshness boost.
    pub now: DateTime<Utc>,
    /// Maximum results to return.
    pub limit: Option<usize>,
    /// If true, populate [`ScoreExplanation`] on each result.
    pub explain: bool,
}

/// Per-signal scoring breakdown for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreExplanation {
    pub title: u32,
    pub title_prefix: u32,
    pub body_occurrences: usize,
    pub body: u32,
    pub author: u32,
    pub matching_tags: usize,
    pub tags: u32,
    pub freshness: u32,
}

impl ScoreExplanation {
    pub fn total(&self) -> u32 {
        self.title + self.title_prefix + self.body + self.author + self.tags + self.freshness
    }
}

/// A ranked document. Borrowed from the caller's corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult<'a> {
    pub document: &'a SearchDocument,
    pub score: u32,
    pub explain: Option<ScoreExplanation>,
}

/// Filter, score, and order `corpus` for the request.
pub fn rank<'a>(corpus: &'a [SearchDocument], req: &SearchRequest<'_>) -> Vec<ScoredResult<'a>> {
    let query = req.query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<ScoredResult<'a>> = corpus
        .iter()
        .filter(|doc| matches_text(doc, &query) && passes_filters(doc, req.filters, req.now))
        .map(|doc| {
            let breakdown = score_document(doc, &query, req.now);
            ScoredResult {
                document: doc,
                score: breakdown.total(),
                explain: req.explain.then_some(breakdown),
            }
        })
        .collect();

    // Vec::sort_by is stable; ties keep corpus order.
    results.sort_by(|a, b| b.score.cmp(&a.score));

    if let Some(limit) = req.limit {
        results.truncate(limit);
    }

    tracing::debug!(query = %query, hits = results.len(), "ranked corpus");
    results
}

/// Rank `corpus` against `query` as of the current time.
pub fn search<'a>(
    corpus: &'a [SearchDocument],
    query: &str,
    filters: &FilterState,
) -> Vec<&'a SearchDocument> {
    let req = SearchRequest {
        query,
        filters,
        now: Utc::now(),
        limit: None,
        explain: false,
    };
    rank(corpus, &req).into_iter().map(|r| r.document).collect()
}

/// Literal substring match against title, body, author, or any tag.
///
/// `query_lower` must already be lowercased.
pub fn matches_text(doc: &SearchDocument, query_lower: &str) -> bool {
    doc.title.to_lowercase().contains(query_lower)
        || doc.body.to_lowercase().contains(query_lower)
        || doc
            .author
            .as_ref()
            .is_some_and(|a| a.to_lowercase().contains(query_lower))
        || doc
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(query_lower))
}

/// Category and recency filters. Undated documents pass any recency filter.
pub fn passes_filters(doc: &SearchDocument, filters: &FilterState, now: DateTime<Utc>) -> bool {
    if !filters.category.matches(&doc.category) {
        return false;
    }
    match (filters.recency.max_days(), doc.published_at) {
        (Some(max_days), Some(published)) => days_between(published, now) <= max_days,
        _ => true,
    }
}

/// Compute the per-signal score of a document. `query_lower` must already
/// be lowercased.
pub fn score_document(
    doc: &SearchDocument,
    query_lower: &str,
    now: DateTime<Utc>,
) -> ScoreExplanation {
    let mut s = ScoreExplanation::default();

    let title = doc.title.to_lowercase();
    if title.contains(query_lower) {
        s.title = TITLE_MATCH_POINTS;
        if title.starts_with(query_lower) {
            s.title_prefix = TITLE_PREFIX_POINTS;
        }
    }

    s.body_occurrences = doc.body.to_lowercase().matches(query_lower).count();
    s.body = BODY_OCCURRENCE_POINTS * s.body_occurrences as u32;

    if doc
        .author
        .as_ref()
        .is_some_and(|a| a.to_lowercase().contains(query_lower))
    {
        s.author = AUTHOR_MATCH_POINTS;
    }

    s.matching_tags = doc
        .tags
        .iter()
        .filter(|t| t.to_lowercase().contains(query_lower))
        .count();
    s.tags = TAG_MATCH_POINTS * s.matching_tags as u32;

    if let Some(published) = doc.published_at {
        if days_between(published, now) < FRESHNESS_WINDOW_DAYS {
            s.freshness = FRESHNESS_POINTS;
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 15, 12, 0, 0).unwrap()
    }

    fn request<'a>(query: &'a str, filters: &'a FilterState) -> SearchRequest<'a> {
        SearchRequest {
            query,
            filters,
            now: now(),
            limit: None,
            explain: false,
        }
    }

    fn ids<'a>(results: &[ScoredResult<'a>]) -> Vec<&'a str> {
        results.iter().map(|r| r.document.id.as_str()).collect()
    }

    #[test]
    fn test_title_match_ranks_first() {
        let corpus = vec![
            SearchDocument::new("camp", "Youth Camp", "Games, worship and prayer.", "events"),
            SearchDocument::new("prayer", "Prayer Meeting", "Corporate worship.", "events"),
        ];
        let filters = FilterState::default();
        let results = rank(&corpus, &request("Prayer", &filters));

        assert_eq!(ids(&results), vec!["prayer", "camp"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let corpus = vec![
            SearchDocument::new("first", "Choir night", "", "events"),
            SearchDocument::new("second", "Band and choir", "", "events"),
            SearchDocument::new("third", "Choir retreat", "", "events"),
        ];
        let filters = FilterState::default();
        let results = rank(&corpus, &request("choir", &filters));

        // first and third both score 15; second scores 10.
        assert_eq!(ids(&results), vec!["first", "third", "second"]);
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn test_special_characters_match_literally() {
        let corpus = vec![
            SearchDocument::new("lit", "Formula", "use a.b+c here", "pages"),
            SearchDocument::new("wild", "Other", "axbbc axb+c aab+c", "pages"),
            SearchDocument::new("paren", "Broken (pattern", "[unclosed", "pages"),
        ];
        let filters = FilterState::default();

        let results = rank(&corpus, &request("a.b+c", &filters));
        assert_eq!(ids(&results), vec!["lit"]);

        let results = rank(&corpus, &request("(pattern", &filters));
        assert_eq!(ids(&results), vec!["paren"]);
        let results = rank(&corpus, &request("[unclosed", &filters));
        assert_eq!(ids(&results), vec!["paren"]);
    }

    #[test]
    fn test_recency_week_filter() {
        let corpus = vec![
            SearchDocument::new("old", "Fellowship lunch", "", "events")
                .with_published_at(now() - Duration::days(10)),
            SearchDocument::new("new", "Fellowship dinner", "", "events")
                .with_published_at(now() - Duration::days(3)),
            SearchDocument::new("undated", "Fellowship ministry", "", "ministries"),
        ];
        let filters = FilterState::new(CategoryFilter::All, Recency::Week);
        let results = rank(&corpus, &request("fellowship", &filters));

        let mut got = ids(&results);
        got.sort();
        assert_eq!(got, vec!["new", "undated"]);
    }

    #[test]
    fn test_undated_passes_every_recency() {
        let corpus = vec![SearchDocument::new("u", "Contact Us", "", "pages")];
        for recency in [Recency::All, Recency::Week, Recency::Month, Recency::Year] {
            let filters = FilterState::new(CategoryFilter::All, recency);
            assert_eq!(rank(&corpus, &request("contact", &filters)).len(), 1);
        }
    }

    #[test]
    fn test_category_filter() {
        let corpus = vec![
            SearchDocument::new("s", "Faith That Moves Mountains", "", "sermons"),
            SearchDocument::new("b", "Faith and family", "", "blog"),
        ];
        let filters = FilterState::new(CategoryFilter::Only("blog".into()), Recency::All);
        assert_eq!(ids(&rank(&corpus, &request("faith", &filters))), vec!["b"]);
    }

    #[test]
    fn test_score_components() {
        let doc = SearchDocument::new(
            "d",
            "Worship & Arts Ministry",
            "Worship leaders lead worship. WORSHIP!",
            "ministries",
        )
        .with_author("Worship Team")
        .with_tags(["worship", "music", "praise and worship"])
        .with_published_at(now() - Duration::days(5));

        let s = score_document(&doc, "worship", now());
        assert_eq!(s.title, 10);
        assert_eq!(s.title_prefix, 5);
        assert_eq!(s.body_occurrences, 3);
        assert_eq!(s.body, 6);
        assert_eq!(s.author, 3);
        assert_eq!(s.matching_tags, 2);
        assert_eq!(s.tags, 8);
        assert_eq!(s.freshness, 1);
        assert_eq!(s.total(), 33);
    }

    #[test]
    fn test_body_occurrences_do_not_overlap() {
        let doc = SearchDocument::new("d", "x", "aaaa", "pages");
        assert_eq!(score_document(&doc, "aa", now()).body_occurrences, 2);
    }

    #[test]
    fn test_freshness_is_independent_of_filter() {
        let doc = SearchDocument::new("d", "Advent", "", "blog")
            .with_published_at(now() - Duration::days(45));
        assert_eq!(score_document(&doc, "advent", now()).freshness, 0);

        let filters = FilterState::new(CategoryFilter::All, Recency::Year);
        let results = rank(std::slice::from_ref(&doc), &request("advent", &filters));
        assert_eq!(results[0].score, 15);
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        let corpus = vec![SearchDocument::new("d", "Anything", "", "pages")];
        let filters = FilterState::default();
        assert!(rank(&corpus, &request("   ", &filters)).is_empty());
    }

    #[test]
    fn test_explain_and_limit() {
        let corpus = vec![
            SearchDocument::new("a", "Prayer", "", "events"),
            SearchDocument::new("b", "Night of prayer", "", "events"),
        ];
        let filters = FilterState::default();
        let mut req = request("prayer", &filters);
        req.explain = true;
        req.limit = Some(1);

        let results = rank(&corpus, &req);
        assert_eq!(results.len(), 1);
        let explain = results[0].explain.as_ref().unwrap();
        assert_eq!(explain.total(), results[0].score);
    }

    #[test]
    fn test_search_returns_documents() {
        let corpus = vec![SearchDocument::new("d", "Bible Study", "Tuesday", "events")];
        let found = search(&corpus, "bible", &FilterState::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "d");
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "sermons".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only("sermons".into())
        );
        assert_eq!("Month".parse::<Recency>().unwrap(), Recency::Month);
        assert!("fortnight".parse::<Recency>().is_err());
        assert!("".parse::<CategoryFilter>().is_err());
    }
}
