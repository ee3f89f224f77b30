mod api_types;
mod config;
mod fetch;
mod firestore;
mod genres;
mod google_auth;
mod models;
mod orchestrator;
mod publish;
mod stats;
mod store;
mod tmdb;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};

use config::Config;
use firestore::FirestoreStore;
use google_auth::FirestoreSettings;
use orchestrator::{run_update, FetchMode, RunOptions};
use store::{DocumentStore, JsonDirStore};
use tmdb::TmdbClient;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Equal number of popular movies per genre
    Balanced,
    /// First N pages of the global popular listing
    Popular,
}

/// Movie Stats Sync - TMDB movies and per-genre statistics into Firestore
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// How movies are collected
    #[arg(long, value_enum, default_value_t = Mode::Balanced)]
    mode: Mode,

    /// Movies to collect per genre (balanced mode)
    #[arg(long, default_value_t = 100)]
    target_per_genre: usize,

    /// Pages of the popular listing to read (popular mode)
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Top-rated movies kept per genre
    #[arg(long, default_value_t = stats::DEFAULT_TOP_COUNT)]
    top_count: usize,

    /// Write a local JSON snapshot here instead of Firestore
    #[arg(short, long)]
    output_dir: Option<String>,

    /// Delete every document in the movies and genres collections, then exit
    #[arg(long)]
    purge: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so RUST_LOG from it reaches the filter
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    let args = Args::parse();
    if !dotenv_loaded {
        debug!("No .env file found, using process environment only");
    }

    info!("Starting movie_stats_sync");

    // All credentials are checked before the first request goes out.
    let cfg = Config::from_env()?;
    let store: Box<dyn DocumentStore> = match &args.output_dir {
        Some(dir) => {
            info!("Using local JSON snapshot - output_dir={}", dir);
            Box::new(JsonDirStore::new(dir))
        }
        None => Box::new(FirestoreStore::new(FirestoreSettings::from_env()?)?),
    };

    if args.purge {
        warn!(
            "Purging collections - movies={}, genres={}",
            cfg.collections.movies, cfg.collections.genres
        );
        let deleted = publish::purge_all(store.as_ref(), &cfg.collections).await?;
        info!("Purge completed - documents={}", deleted);
        return Ok(());
    }

    let mode = match args.mode {
        Mode::Balanced => FetchMode::Balanced {
            target_per_genre: args.target_per_genre,
        },
        Mode::Popular => FetchMode::Popular { pages: args.pages },
    };
    let opts = RunOptions {
        mode,
        top_count: args.top_count,
        request_delay: cfg.request_delay,
    };

    let source = TmdbClient::new(cfg.tmdb_token.clone(), cfg.tmdb_base_url.clone())?;
    let summary = run_update(&source, store.as_ref(), &cfg.collections, &opts).await?;
    info!(
        "Run summary - genres={}, movies={}, duplicates={}, skipped={}, genre_stats={}, documents={}",
        summary.genres,
        summary.movies,
        summary.duplicates,
        summary.skipped,
        summary.genre_stats,
        summary.documents_written
    );
    Ok(())
}
