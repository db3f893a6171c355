//! # Ekklesia
//!
//! Content toolkit for the Ekklesia Zion Embassy website. It pulls entries
//! from Contentful and resolves their link graphs into display records,
//! renders rich text, lists sermons from the church YouTube channel, and
//! runs the site's search with a persisted query history.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────────┐   ┌───────────────┐
//! │ Contentful  │──▶│ ekklesia-core  │──▶│ DisplayRecord │
//! │ File/Custom │   │ parse+normalize│   │ HTML          │
//! └─────────────┘   └────────────────┘   └───────────────┘
//!
//! ┌─────────────┐   ┌────────────────┐   ┌───────────────┐
//! │ corpus.json │──▶│ rank+highlight │──▶│ SearchHit     │
//! └─────────────┘   └───────┬────────┘   └───────────────┘
//!                           ▼
//!                    history.json
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ekk search "prayer" --recency month
//! ekk history list
//! ekk content upcoming-events --limit 5
//! ekk normalize saved-response.json
//! ekk render body.json --includes saved-response.json
//! ekk sermons --category sunday
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`traits`] | `ContentSource` extension point and entry queries |
//! | [`contentful`] | Contentful delivery/preview client |
//! | [`content`] | Content, normalize and render commands |
//! | [`youtube`] | Sermon listings and live detection |
//! | [`corpus`] | Site search corpus |
//! | [`search`] | Site search and history commands |
//! | [`history_store`] | JSON-file key-value store |

pub mod config;
pub mod content;
pub mod contentful;
pub mod corpus;
pub mod history_store;
pub mod search;
pub mod traits;
pub mod youtube;
