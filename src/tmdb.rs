use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::api_types::*;

/// Result of a request that reached the server. Non-success statuses are data, not errors:
/// callers log them and carry on with an empty unit of work.
#[derive(Debug, Clone)]
pub enum Fetched<T> {
    Body(T),
    Failed(StatusCode),
}

/// The three TMDB listings the job reads from.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn genre_list(&self) -> Result<Fetched<Vec<ApiGenre>>>;
    async fn popular_page(&self, page: u32) -> Result<Fetched<Vec<ApiMovie>>>;
    async fn discover_page(&self, genre_id: i64, page: u32) -> Result<Fetched<Vec<ApiMovie>>>;
}

pub struct TmdbClient {
    client: Client,
    bearer_token: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(bearer_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            bearer_token: bearer_token.into(),
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse_with_params(&raw, params).with_context(|| format!("invalid TMDB url {}", raw))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<Fetched<T>> {
        let start = std::time::Instant::now();
        let resp = self
            .client
            .get(url.clone())
            .bearer_auth(&self.bearer_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url.path()))?;

        let status = resp.status();
        if !status.is_success() {
            debug!("TMDB request rejected - path={}, status={}", url.path(), status);
            return Ok(Fetched::Failed(status));
        }

        let body: T = resp
            .json()
            .await
            .with_context(|| format!("Decoding JSON for {}", url.path()))?;
        debug!(
            "TMDB request completed - path={}, query={}, duration={:.2}s",
            url.path(),
            url.query().unwrap_or(""),
            start.elapsed().as_secs_f32()
        );
        Ok(Fetched::Body(body))
    }
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn genre_list(&self) -> Result<Fetched<Vec<ApiGenre>>> {
        let url = self.endpoint("/genre/movie/list", &[("language", "en".to_string())])?;
        Ok(match self.get_json::<ApiGenreList>(url).await? {
            Fetched::Body(list) => Fetched::Body(list.genres),
            Fetched::Failed(status) => Fetched::Failed(status),
        })
    }

    async fn popular_page(&self, page: u32) -> Result<Fetched<Vec<ApiMovie>>> {
        let url = self.endpoint(
            "/movie/popular",
            &[("language", "en-US".to_string()), ("page", page.to_string())],
        )?;
        Ok(match self.get_json::<ApiMoviePage>(url).await? {
            Fetched::Body(p) => Fetched::Body(p.results),
            Fetched::Failed(status) => Fetched::Failed(status),
        })
    }

    async fn discover_page(&self, genre_id: i64, page: u32) -> Result<Fetched<Vec<ApiMovie>>> {
        let url = self.endpoint(
            "/discover/movie",
            &[
                ("language", "en-US".to_string()),
                ("sort_by", "popularity.desc".to_string()),
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
            ],
        )?;
        Ok(match self.get_json::<ApiMoviePage>(url).await? {
            Fetched::Body(p) => Fetched::Body(p.results),
            Fetched::Failed(status) => Fetched::Failed(status),
        })
    }
}
