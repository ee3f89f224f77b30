use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiGenreList {
    #[serde(default)]
    pub genres: Vec<ApiGenre>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiGenre {
    pub id: i64,
    pub name: String,
}

/// One page of `/movie/popular` or `/discover/movie`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMoviePage {
    #[serde(default)]
    pub results: Vec<ApiMovie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMovie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub vote_average: Option<f64>, // null for unreleased titles
    #[serde(default)]
    pub genre_ids: Option<Vec<i64>>, // null on some discover entries
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
}
