use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::config::Collections;
use crate::models::{GenreStats, Movie};
use crate::store::{DocumentStore, WriteBatch, MAX_BATCH_WRITES};

/// Commit `(id, document)` pairs into `collection`, one batch per `MAX_BATCH_WRITES` documents.
/// Batches go out one at a time; a failed commit stops the run and leaves earlier batches in place.
async fn write_in_batches<S, T>(store: &S, collection: &str, docs: &[(String, &T)], label: &str) -> Result<usize>
where
    S: DocumentStore + ?Sized,
    T: Serialize,
{
    for (n, chunk) in docs.chunks(MAX_BATCH_WRITES).enumerate() {
        let mut batch = WriteBatch::new();
        for (id, doc) in chunk {
            batch.set(collection, id, *doc)?;
        }
        store
            .commit(batch)
            .await
            .with_context(|| format!("committing {} batch {}", label, n + 1))?;
        info!("Batch {} ({}) completed - documents={}", n + 1, label, chunk.len());
    }
    Ok(docs.len())
}

/// Overwrite every movie (keyed by id) and every genre's stats (keyed by lower-cased name).
pub async fn publish<S: DocumentStore + ?Sized>(
    store: &S,
    collections: &Collections,
    movies: &[Movie],
    stats: &[GenreStats],
) -> Result<usize> {
    info!("Uploading movies in batches - movies={}, collection={}", movies.len(), collections.movies);
    let movie_docs: Vec<(String, &Movie)> = movies.iter().map(|m| (m.id.to_string(), m)).collect();
    let written_movies = write_in_batches(store, &collections.movies, &movie_docs, "movies").await?;

    info!("Updating genre statistics - genres={}, collection={}", stats.len(), collections.genres);
    let stat_docs: Vec<(String, &GenreStats)> = stats.iter().map(|s| (s.doc_id(), s)).collect();
    let written_stats = write_in_batches(store, &collections.genres, &stat_docs, "genres").await?;

    info!("All data synchronized - documents={}", written_movies + written_stats);
    Ok(written_movies + written_stats)
}

/// Delete everything in both collections. No confirmation: callers decide when this runs.
pub async fn purge_all<S: DocumentStore + ?Sized>(store: &S, collections: &Collections) -> Result<usize> {
    let mut deleted = 0;
    for col in [&collections.movies, &collections.genres] {
        let n = store
            .recursive_delete(col)
            .await
            .with_context(|| format!("deleting collection {}", col))?;
        info!("Deleted all documents from collection - collection={}, documents={}", col, n);
        deleted += n;
    }
    Ok(deleted)
}
