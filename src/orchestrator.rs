use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Collections;
use crate::fetch::{fetch_popular_movies, fetch_representative_movies};
use crate::genres::fetch_genre_map;
use crate::models::RunSummary;
use crate::publish::publish;
use crate::stats::calculate_stats;
use crate::store::DocumentStore;
use crate::tmdb::MovieSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Equal share of the most popular movies for every genre.
    Balanced { target_per_genre: usize },
    /// The first `pages` pages of the global popular listing.
    Popular { pages: u32 },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: FetchMode,
    pub top_count: usize,
    pub request_delay: Duration,
}

/// One full sync: genres, movies, per-genre stats, then the store.
pub async fn run_update<S, D>(source: &S, store: &D, collections: &Collections, opts: &RunOptions) -> Result<RunSummary>
where
    S: MovieSource + ?Sized,
    D: DocumentStore + ?Sized,
{
    let pipeline_start = std::time::Instant::now();
    info!("Pipeline started - mode={:?}, top_count={}", opts.mode, opts.top_count);

    // 1) genres
    let genres = fetch_genre_map(source).await?;
    if genres.is_empty() {
        warn!("Genre list is empty - every movie will be filed under Other");
    }

    // 2) movies
    let fetch_start = std::time::Instant::now();
    let fetched = match opts.mode {
        FetchMode::Balanced { target_per_genre } => {
            fetch_representative_movies(source, &genres, target_per_genre, opts.request_delay).await?
        }
        FetchMode::Popular { pages } => fetch_popular_movies(source, &genres, pages, opts.request_delay).await?,
    };
    info!(
        "Movie fetch completed - duration={:.2}s, movies={}, duplicates={}",
        fetch_start.elapsed().as_secs_f32(),
        fetched.movies.len(),
        fetched.duplicates
    );

    // 3) stats
    let stats = calculate_stats(&fetched.movies, opts.top_count);
    info!(
        "Statistics calculated - genres={}, skipped_movies={}",
        stats.stats.len(),
        stats.skipped
    );

    // 4) store
    let persist_start = std::time::Instant::now();
    let written = publish(store, collections, &fetched.movies, &stats.stats).await?;
    info!(
        "Output persisted - duration={:.2}s, documents={}",
        persist_start.elapsed().as_secs_f32(),
        written
    );

    let summary = RunSummary {
        genres: genres.len(),
        movies: fetched.movies.len(),
        duplicates: fetched.duplicates,
        skipped: stats.skipped,
        genre_stats: stats.stats.len(),
        documents_written: written,
    };
    info!(
        "Pipeline completed successfully - total_duration={:.2}s, movies={}, genres={}",
        pipeline_start.elapsed().as_secs_f32(),
        summary.movies,
        summary.genre_stats
    );
    Ok(summary)
}
