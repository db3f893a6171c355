//! The site search corpus.
//!
//! The built-in corpus is compiled into the binary from `data/corpus.json`.
//! Deployments with their own page list point `search.corpus_path` at a
//! file of the same shape.

use anyhow::{Context, Result};
use std::path::Path;

use ekklesia_core::models::SearchDocument;

use crate::config::Config;

const BUILTIN_CORPUS: &str = include_str!("../data/corpus.json");

/// Parse a corpus from JSON text (an array of documents).
pub fn parse_corpus(json: &str) -> Result<Vec<SearchDocument>> {
    serde_json::from_str(json).context("Invalid search corpus")
}

/// The corpus compiled into the binary.
pub fn builtin_corpus() -> Result<Vec<SearchDocument>> {
    parse_corpus(BUILTIN_CORPUS)
}

/// Read a corpus file.
pub fn read_corpus(path: &Path) -> Result<Vec<SearchDocument>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus: {}", path.display()))?;
    parse_corpus(&text).with_context(|| format!("in {}", path.display()))
}

/// The configured corpus, falling back to the built-in one.
pub fn load_corpus(config: &Config) -> Result<Vec<SearchDocument>> {
    match &config.search.corpus_path {
        Some(path) => read_corpus(path),
        None => builtin_corpus(),
    }
}
