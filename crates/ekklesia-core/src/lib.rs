//! # Ekklesia Core
//!
//! Shared, WASM-safe logic for the Ekklesia site toolkit: content models,
//! delivery-response parsing, link-graph normalization, rich text rendering,
//! relevance ranking, highlighting, and search history.
//!
//! This crate contains no tokio, reqwest, filesystem I/O, or other
//! native-only dependencies. Every operation is a synchronous function of
//! its inputs; callers supply the clock (`now`) where time matters.

pub mod dates;
pub mod delivery;
pub mod highlight;
pub mod history;
pub mod models;
pub mod normalize;
pub mod richtext;
pub mod search;
