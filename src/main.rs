//! # Ministry assistant CLI (`massist`)
//!
//! ## Usage
//!
//! ```bash
//! massist --config ./config/assistant.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `massist init` | Create the SQLite database and schema |
//! | `massist import <seed.json>` | Load documents and excerpts from a seed file |
//! | `massist classify "<query>"` | Show the intent classification for a query |
//! | `massist search "<query>"` | Ranked document search |
//! | `massist ask "<query>"` | Full pipeline; prints the response as JSON |
//! | `massist serve` | Start the HTTP server |
//!
//! Logs go to stderr. Set `RUST_LOG` to override the default
//! `ministry_assistant=info` filter.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ministry_assistant::{config, import, intent, migrate, router, search, server};

/// Intent-routed question answering over a ministry's public documents.
#[derive(Parser)]
#[command(
    name = "massist",
    about = "Ministry assistant: intent routing, document search and grounded answers",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/assistant.toml`. See
    /// `config/assistant.example.toml` for every section.
    #[arg(long, global = true, default_value = "./config/assistant.toml")]
    config: PathBuf,

    /// Log at debug level (ignored when `RUST_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Import documents and excerpts from a JSON seed file.
    ///
    /// Documents are upserted by URL and their excerpts replaced, so the
    /// same file can be imported repeatedly.
    Import {
        /// Path to the seed file.
        file: PathBuf,
    },

    /// Classify a query without touching the store or the network.
    Classify {
        query: String,
    },

    /// Search documents and excerpts.
    Search {
        query: String,

        /// Maximum number of results (defaults to `retrieval.document_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Answer a query through the full pipeline.
    Ask {
        query: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "ministry_assistant=debug"
    } else {
        "ministry_assistant=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        // Classification is pure; it needs no config.
        Commands::Classify { query } => {
            let result = intent::classify(&query);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Init => {
            let cfg = config::load_config(&cli.config)?;
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            let cfg = config::load_config(&cli.config)?;
            import::run_import(&cfg, &file).await?;
        }
        Commands::Search { query, limit } => {
            let cfg = config::load_config(&cli.config)?;
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Ask { query } => {
            let cfg = config::load_config(&cli.config)?;
            router::run_ask(&cfg, &query).await?;
        }
        Commands::Serve => {
            let cfg = config::load_config(&cli.config)?;
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
