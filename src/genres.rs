use anyhow::Result;
use tracing::{info, warn};

use crate::models::GenreMap;
use crate::tmdb::{Fetched, MovieSource};

/// Load the genre list. A rejected request is not fatal: the run continues with an empty
/// map and every movie lands in the "Other" genre.
pub async fn fetch_genre_map<S: MovieSource + ?Sized>(source: &S) -> Result<GenreMap> {
    match source.genre_list().await? {
        Fetched::Body(genres) => {
            let map: GenreMap = genres.into_iter().map(|g| (g.id, g.name)).collect();
            info!("Genre list loaded - genres={}", map.len());
            Ok(map)
        }
        Fetched::Failed(status) => {
            warn!("Failed to fetch genres from API, using fallback - status={}", status);
            Ok(GenreMap::new())
        }
    }
}
