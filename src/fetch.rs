use anyhow::{Context, Result};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api_types::ApiMovie;
use crate::models::*;
use crate::tmdb::{Fetched, MovieSource};

/// `/discover/movie` always answers with 20 results per page.
pub const DISCOVER_PAGE_SIZE: usize = 20;

/// Map genre ids to names; unknown ids become "Other", and so does a movie with no ids at all.
pub fn resolve_genres(genre_ids: Option<&[i64]>, genres: &GenreMap) -> Vec<String> {
    match genre_ids {
        Some(ids) if !ids.is_empty() => ids
            .iter()
            .map(|id| genres.get(id).cloned().unwrap_or_else(|| OTHER_GENRE.to_string()))
            .collect(),
        _ => vec![OTHER_GENRE.to_string()],
    }
}

fn to_movie(m: ApiMovie, genres: &GenreMap) -> Movie {
    let genre_names = resolve_genres(m.genre_ids.as_deref(), genres);
    Movie {
        id: m.id,
        title: m.title,
        rating: m.vote_average.unwrap_or(0.0),
        genres: genre_names,
        poster_path: m.poster_path,
        release_date: m.release_date,
        popularity: m.popularity,
        vote_count: m.vote_count,
    }
}

/// Popular listing, pages `1..=pages`, deduplicated by id.
pub async fn fetch_popular_movies<S: MovieSource + ?Sized>(
    source: &S,
    genres: &GenreMap,
    pages: u32,
    delay: Duration,
) -> Result<FetchOutcome> {
    let mut out = FetchOutcome::default();
    let mut seen_ids: HashSet<i64> = HashSet::new();

    info!("Loading popular movies - pages={}", pages);
    for page in 1..=pages {
        let fetched = source.popular_page(page).await?;
        tokio::time::sleep(delay).await;

        let movies_on_page = match fetched {
            Fetched::Body(movies) => movies,
            Fetched::Failed(status) => {
                warn!("Popular page failed - page={}, status={}", page, status);
                continue;
            }
        };

        let on_page = movies_on_page.len();
        for m in movies_on_page {
            if !seen_ids.insert(m.id) {
                out.duplicates += 1;
                continue;
            }
            out.movies.push(to_movie(m, genres));
        }
        info!(
            "Popular page processed - page={}/{}, movies_on_page={}, total={}, duplicates={}",
            page,
            pages,
            on_page,
            out.movies.len(),
            out.duplicates
        );
    }

    info!("Popular fetch completed - movies={}", out.movies.len());
    if out.duplicates > 0 {
        warn!("Skipped duplicate movies - duplicates={}", out.duplicates);
    }
    Ok(out)
}

/// Up to `target_per_genre` movies for every genre, most popular first.
///
/// A movie already taken for an earlier genre still counts toward the current genre's
/// quota, so genres that share their most popular titles do not page further than needed.
pub async fn fetch_representative_movies<S: MovieSource + ?Sized>(
    source: &S,
    genres: &GenreMap,
    target_per_genre: usize,
    delay: Duration,
) -> Result<FetchOutcome> {
    let mut out = FetchOutcome::default();
    let mut seen_ids: HashSet<i64> = HashSet::new();
    let pages_needed = u32::try_from(target_per_genre.div_ceil(DISCOVER_PAGE_SIZE))
        .with_context(|| format!("target_per_genre {} needs too many pages", target_per_genre))?;

    info!(
        "Representative fetch started - target_per_genre={}, genres={}, pages_per_genre={}",
        target_per_genre,
        genres.len(),
        pages_needed
    );

    for (&genre_id, genre_name) in genres {
        debug!("Processing genre - name={}, id={}", genre_name, genre_id);
        let mut collected = 0usize;

        for page in 1..=pages_needed {
            if collected >= target_per_genre {
                break;
            }

            let fetched = source.discover_page(genre_id, page).await?;
            tokio::time::sleep(delay).await;

            let movies_on_page = match fetched {
                Fetched::Body(movies) => movies,
                Fetched::Failed(status) => {
                    warn!(
                        "Discover page failed, moving to next genre - genre={}, page={}, status={}",
                        genre_name, page, status
                    );
                    break;
                }
            };

            if movies_on_page.is_empty() {
                debug!("Genre exhausted - genre={}, page={}", genre_name, page);
                break;
            }

            for m in movies_on_page {
                if collected >= target_per_genre {
                    break;
                }
                collected += 1;
                if !seen_ids.insert(m.id) {
                    out.duplicates += 1;
                    continue;
                }
                out.movies.push(to_movie(m, genres));
            }
        }

        info!(
            "Genre collected - genre={}, collected={}, total={}",
            genre_name,
            collected,
            out.movies.len()
        );
    }

    info!("Representative fetch completed - movies={}", out.movies.len());
    if out.duplicates > 0 {
        warn!(
            "Skipped duplicates (movies belonging to multiple genres) - duplicates={}",
            out.duplicates
        );
    }
    Ok(out)
}
