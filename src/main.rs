//! # Ekklesia CLI (`ekk`)
//!
//! Command-line front end for the site toolkit.
//!
//! ## Usage
//!
//! ```bash
//! ekk --config ./config/ekklesia.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ekk search "<query>"` | Search the site corpus |
//! | `ekk history list\|remove\|clear` | Manage search history |
//! | `ekk content <type>` | Fetch a Contentful listing |
//! | `ekk content-search "<query>"` | Search Contentful entries |
//! | `ekk check` | Verify Contentful credentials |
//! | `ekk normalize <file>` | Resolve links in a saved response |
//! | `ekk render <file>` | Render a saved rich text document |
//! | `ekk sermons` | List recent sermons from YouTube |
//! | `ekk live` | Check for a live broadcast |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ekklesia::config::{self, Config};
use ekklesia::content::{self, ContentKind};
use ekklesia::search;
use ekklesia::youtube::{self, SermonCategory};
use ekklesia_core::search::{CategoryFilter, FilterState, Recency};

/// Ekklesia site toolkit: content, sermons, and search.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means defaults; see `config/ekklesia.example.toml`.
#[derive(Parser)]
#[command(name = "ekk", version, about = "Ekklesia Zion Embassy site toolkit")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ekklesia.toml")]
    config: PathBuf,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the site corpus.
    ///
    /// The query is matched literally and case-insensitively against
    /// titles, content, authors, and tags, and recorded in the history.
    Search {
        query: String,

        /// Category to search (`all`, `sermons`, `events`, `ministries`, `blog`, `pages`).
        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        /// Only documents from the last `week`, `month`, or `year`.
        #[arg(long, default_value = "all")]
        recency: Recency,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,

        /// Show the per-signal score breakdown.
        #[arg(long)]
        explain: bool,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or edit the search history.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Fetch a content listing from Contentful.
    ///
    /// Types: events, upcoming-events, projects, active-projects, blog,
    /// published-blog, featured-blog, sermons.
    Content {
        kind: ContentKind,

        #[arg(long)]
        limit: Option<usize>,

        /// Read drafts from the preview API.
        #[arg(long)]
        preview: bool,

        #[arg(long)]
        json: bool,
    },

    /// Search blog posts, events, and projects in Contentful.
    ContentSearch {
        query: String,

        #[arg(long)]
        preview: bool,

        #[arg(long)]
        json: bool,
    },

    /// Verify the Contentful space and token.
    Check {
        #[arg(long)]
        preview: bool,
    },

    /// Resolve links in a saved delivery response and print display records.
    Normalize { path: PathBuf },

    /// Render a saved rich text document to HTML.
    Render {
        path: PathBuf,

        /// Saved delivery response whose `includes` resolve embedded items.
        #[arg(long)]
        includes: Option<PathBuf>,
    },

    /// List recent sermons from the church YouTube channel.
    Sermons {
        /// Page size (1-50).
        #[arg(long)]
        limit: Option<u32>,

        /// `sunday`, `series`, `special`, or `youth`.
        #[arg(long)]
        category: Option<SermonCategory>,

        /// Keep sermons whose title or description contains this text.
        #[arg(long)]
        filter: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Check whether the channel is live.
    Live,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show recent queries, newest first.
    List,
    /// Forget one query.
    Remove { query: String },
    /// Forget all queries.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    // Offline commands don't need a config file
    match &cli.command {
        Commands::Normalize { path } => return content::run_normalize(path),
        Commands::Render { path, includes } => {
            return content::run_render(path, includes.as_deref())
        }
        _ => {}
    }

    let cfg: Config = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            category,
            recency,
            limit,
            explain,
            json,
        } => {
            let filters = FilterState::new(category, recency);
            search::run_search(&cfg, &query, &filters, limit, explain, json)?;
        }
        Commands::History { action } => match action {
            HistoryAction::List => search::run_history_list(&cfg)?,
            HistoryAction::Remove { query } => search::run_history_remove(&cfg, &query)?,
            HistoryAction::Clear => search::run_history_clear(&cfg)?,
        },
        Commands::Content {
            kind,
            limit,
            preview,
            json,
        } => {
            content::run_content(&cfg, kind, limit, preview, json).await?;
        }
        Commands::ContentSearch {
            query,
            preview,
            json,
        } => {
            content::run_content_search(&cfg, &query, preview, json).await?;
        }
        Commands::Check { preview } => {
            content::run_content_check(&cfg, preview).await?;
        }
        Commands::Sermons {
            limit,
            category,
            filter,
            json,
        } => {
            youtube::run_sermons(&cfg, limit, category, filter.as_deref(), json).await?;
        }
        Commands::Live => {
            youtube::run_live(&cfg).await?;
        }
        Commands::Normalize { .. } | Commands::Render { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
