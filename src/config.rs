use anyhow::{bail, Context, Result};
use std::time::Duration;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 300;
pub const DEFAULT_MOVIES_COLLECTION: &str = "movies";
pub const DEFAULT_GENRES_COLLECTION: &str = "genres";

/// Names of the two collections a run writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub movies: String,
    pub genres: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            movies: DEFAULT_MOVIES_COLLECTION.to_string(),
            genres: DEFAULT_GENRES_COLLECTION.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_token: String,
    pub tmdb_base_url: String,
    pub request_delay: Duration,
    pub collections: Collections,
}

impl Config {
    /// Read the run configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tmdb_token = match lookup("TMDB_BEARER_TOKEN") {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => bail!("TMDB_BEARER_TOKEN is not set (put it in the environment or a .env file)"),
        };

        let tmdb_base_url = lookup("TMDB_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string());

        let delay_ms = match lookup("TMDB_REQUEST_DELAY_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("TMDB_REQUEST_DELAY_MS is not a number: {raw:?}"))?,
            None => DEFAULT_REQUEST_DELAY_MS,
        };

        let collections = Collections {
            movies: lookup("MOVIES_COLLECTION").unwrap_or_else(|| DEFAULT_MOVIES_COLLECTION.to_string()),
            genres: lookup("GENRES_COLLECTION").unwrap_or_else(|| DEFAULT_GENRES_COLLECTION.to_string()),
        };

        Ok(Self {
            tmdb_token,
            tmdb_base_url,
            request_delay: Duration::from_millis(delay_ms),
            collections,
        })
    }
}
