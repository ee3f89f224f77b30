use indexmap::IndexMap;
use itertools::Itertools;
use tracing::{debug, warn};

use crate::models::{GenreStats, Movie, StatsOutcome};

pub const DEFAULT_TOP_COUNT: usize = 10;

/// Round to 2 decimals, halves away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// A movie without votes or without a rating says nothing about its genre.
fn has_rating(m: &Movie) -> bool {
    m.vote_count.unwrap_or(0) > 0 && m.rating > 0.0
}

/// Per-genre averages, totals and top-N, one entry per genre that has a rated movie, in the
/// order genres are first seen.
pub fn calculate_stats(movies: &[Movie], top_count: usize) -> StatsOutcome {
    let mut groups: IndexMap<&str, Vec<&Movie>> = IndexMap::new();
    let mut skipped: Vec<&Movie> = Vec::new();

    for m in movies {
        if !has_rating(m) {
            skipped.push(m);
            continue;
        }
        for genre in &m.genres {
            groups.entry(genre.as_str()).or_default().push(m);
        }
    }

    if !skipped.is_empty() {
        warn!("Found movies without rating, skipped for statistics - count={}", skipped.len());
        for sm in &skipped {
            warn!(
                " - {} | Genres: [{}] | Rating: {} (Votes: {})",
                sm.title,
                sm.genres.iter().join(", "),
                sm.rating,
                sm.vote_count.unwrap_or(0)
            );
        }
    }

    let stats: Vec<GenreStats> = groups
        .into_iter()
        .map(|(genre, group)| {
            let movie_count = group.len();
            let n = movie_count as f64;
            let avg_rating = group.iter().map(|m| m.rating).sum::<f64>() / n;
            let avg_popularity = group.iter().map(|m| m.popularity.unwrap_or(0.0)).sum::<f64>() / n;
            let total_votes: i64 = group.iter().map(|m| m.vote_count.unwrap_or(0)).sum();

            // sort_by is stable: equal ratings keep collection order
            let mut ranked = group;
            ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
            let top_movies: Vec<Movie> = ranked.into_iter().take(top_count).cloned().collect();

            debug!(
                "Genre stats - genre={}, movies={}, avg_rating={:.2}, total_votes={}",
                genre, movie_count, avg_rating, total_votes
            );

            GenreStats {
                genre_name: genre.to_string(),
                average_rating: round2(avg_rating),
                average_popularity: round2(avg_popularity),
                total_votes,
                movie_count,
                top_movies,
            }
        })
        .collect();

    StatsOutcome {
        stats,
        skipped: skipped.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, rating: f64, votes: Option<i64>, popularity: Option<f64>, genres: &[&str]) -> Movie {
        Movie {
            id,
            title: format!("movie {}", id),
            rating,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            poster_path: None,
            release_date: None,
            popularity,
            vote_count: votes,
        }
    }

    fn ids(movies: &[Movie]) -> Vec<i64> {
        movies.iter().map(|m| m.id).collect()
    }

    #[test]
    fn unrated_movie_is_excluded() {
        let movies = vec![
            movie(1, 8.0, Some(10), Some(4.0), &["Action"]),
            movie(2, 6.0, Some(5), Some(2.0), &["Action"]),
            movie(3, 0.0, Some(0), Some(100.0), &["Action"]),
        ];
        let out = calculate_stats(&movies, DEFAULT_TOP_COUNT);

        assert_eq!(out.skipped, 1);
        assert_eq!(out.stats.len(), 1);
        let action = &out.stats[0];
        assert_eq!(action.genre_name, "Action");
        assert_eq!(action.average_rating, 7.0);
        assert_eq!(action.average_popularity, 3.0);
        assert_eq!(action.total_votes, 15);
        assert_eq!(action.movie_count, 2);
        assert_eq!(ids(&action.top_movies), [1, 2]);
    }

    #[test]
    fn zero_votes_or_zero_rating_alone_excludes() {
        let movies = vec![
            movie(1, 7.5, Some(0), None, &["Drama"]),
            movie(2, 0.0, Some(40), None, &["Drama"]),
            movie(3, 5.0, None, None, &["Drama"]),
            movie(4, 6.0, Some(-1), None, &["Horror"]),
        ];
        let out = calculate_stats(&movies, DEFAULT_TOP_COUNT);
        assert!(out.stats.is_empty());
        assert_eq!(out.skipped, 4);
    }

    #[test]
    fn multi_genre_movie_counts_in_each_genre_in_first_seen_order() {
        let movies = vec![
            movie(1, 7.0, Some(1), None, &["Thriller", "Action"]),
            movie(2, 9.0, Some(1), None, &["Action"]),
            movie(3, 5.0, Some(1), None, &["Comedy", "Thriller"]),
        ];
        let out = calculate_stats(&movies, DEFAULT_TOP_COUNT);
        let names: Vec<&str> = out.stats.iter().map(|s| s.genre_name.as_str()).collect();
        assert_eq!(names, ["Thriller", "Action", "Comedy"]);
        assert_eq!(out.stats[0].movie_count, 2);
        assert_eq!(ids(&out.stats[1].top_movies), [2, 1]);
        // missing popularity is averaged as zero
        assert_eq!(out.stats[0].average_popularity, 0.0);
    }

    #[test]
    fn top_movies_truncate_and_keep_tie_order() {
        let movies = vec![
            movie(1, 6.0, Some(1), None, &["Action"]),
            movie(2, 8.0, Some(1), None, &["Action"]),
            movie(3, 6.0, Some(1), None, &["Action"]),
            movie(4, 8.0, Some(1), None, &["Action"]),
            movie(5, 7.0, Some(1), None, &["Action"]),
        ];
        let out = calculate_stats(&movies, 3);
        assert_eq!(ids(&out.stats[0].top_movies), [2, 4, 5]);

        let out = calculate_stats(&movies, 10);
        assert_eq!(ids(&out.stats[0].top_movies), [2, 4, 5, 1, 3]);
        assert_eq!(out.stats[0].top_movies.len(), out.stats[0].movie_count);
    }

    #[test]
    fn averages_are_rounded_to_two_decimals() {
        let movies = vec![
            movie(1, 7.0, Some(1), Some(10.0), &["Action"]),
            movie(2, 7.0, Some(1), Some(10.0), &["Action"]),
            movie(3, 8.0, Some(1), Some(11.0), &["Action"]),
        ];
        let out = calculate_stats(&movies, DEFAULT_TOP_COUNT);
        assert_eq!(out.stats[0].average_rating, 7.33);
        assert_eq!(out.stats[0].average_popularity, 10.33);

        assert_eq!(round2(2.675_000_1), 2.68);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(1.0 / 3.0 * 2.0), 0.67);
    }

    #[test]
    fn empty_input_produces_nothing() {
        let out = calculate_stats(&[], DEFAULT_TOP_COUNT);
        assert!(out.stats.is_empty());
        assert_eq!(out.skipped, 0);
    }
}
