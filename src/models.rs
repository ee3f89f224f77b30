use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Genre name used when a movie has no genre ids or an id the genre list does not know.
pub const OTHER_GENRE: &str = "Other";

/// Genre id -> display name, in the order the API listed them.
pub type GenreMap = IndexMap<i64, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub rating: f64,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub popularity: Option<f64>, // kept as null when TMDB omits it
    pub vote_count: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub movies: Vec<Movie>,
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreStats {
    pub genre_name: String,
    pub average_rating: f64,
    pub average_popularity: f64,
    pub total_votes: i64,
    pub movie_count: usize,
    pub top_movies: Vec<Movie>,
}

impl GenreStats {
    /// Document id in the genres collection.
    pub fn doc_id(&self) -> String {
        self.genre_name.to_lowercase()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsOutcome {
    pub stats: Vec<GenreStats>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub genres: usize,
    pub movies: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub genre_stats: usize,
    pub documents_written: usize,
}
