//! In-memory stand-ins for TMDB and the document store.

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::api_types::{ApiGenre, ApiMovie};
use crate::store::{DocumentStore, WriteBatch};
use crate::tmdb::{Fetched, MovieSource};

pub fn api_movie(id: i64, title: &str, rating: f64, votes: i64, genre_ids: &[i64]) -> ApiMovie {
    ApiMovie {
        id,
        title: title.to_string(),
        vote_average: Some(rating),
        genre_ids: Some(genre_ids.to_vec()),
        poster_path: Some(format!("/{}.jpg", id)),
        release_date: Some("2024-01-01".to_string()),
        popularity: Some(10.0),
        vote_count: Some(votes),
    }
}

pub fn genre(id: i64, name: &str) -> ApiGenre {
    ApiGenre { id, name: name.to_string() }
}

/// Pages not registered answer with an empty body.
pub struct FakeSource {
    pub genres: Fetched<Vec<ApiGenre>>,
    pub popular: HashMap<u32, Fetched<Vec<ApiMovie>>>,
    pub discover: HashMap<(i64, u32), Fetched<Vec<ApiMovie>>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(genres: Vec<ApiGenre>) -> Self {
        Self {
            genres: Fetched::Body(genres),
            popular: HashMap::new(),
            discover: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_popular(mut self, page: u32, movies: Vec<ApiMovie>) -> Self {
        self.popular.insert(page, Fetched::Body(movies));
        self
    }

    pub fn with_popular_status(mut self, page: u32, status: StatusCode) -> Self {
        self.popular.insert(page, Fetched::Failed(status));
        self
    }

    pub fn with_discover(mut self, genre_id: i64, page: u32, movies: Vec<ApiMovie>) -> Self {
        self.discover.insert((genre_id, page), Fetched::Body(movies));
        self
    }

    pub fn with_discover_status(mut self, genre_id: i64, page: u32, status: StatusCode) -> Self {
        self.discover.insert((genre_id, page), Fetched::Failed(status));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MovieSource for FakeSource {
    async fn genre_list(&self) -> Result<Fetched<Vec<ApiGenre>>> {
        self.record("genres".to_string());
        Ok(self.genres.clone())
    }

    async fn popular_page(&self, page: u32) -> Result<Fetched<Vec<ApiMovie>>> {
        self.record(format!("popular:{}", page));
        Ok(self.popular.get(&page).cloned().unwrap_or(Fetched::Body(Vec::new())))
    }

    async fn discover_page(&self, genre_id: i64, page: u32) -> Result<Fetched<Vec<ApiMovie>>> {
        self.record(format!("discover:{}:{}", genre_id, page));
        Ok(self
            .discover
            .get(&(genre_id, page))
            .cloned()
            .unwrap_or(Fetched::Body(Vec::new())))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub docs: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
    pub commits: Mutex<Vec<usize>>,
    pub fail_on_commit: Option<usize>,
}

impl MemoryStore {
    pub fn failing_on_commit(n: usize) -> Self {
        Self {
            fail_on_commit: Some(n),
            ..Self::default()
        }
    }

    pub fn collection(&self, name: &str) -> BTreeMap<String, Value> {
        self.docs.lock().unwrap().get(name).cloned().unwrap_or_default()
    }

    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut commits = self.commits.lock().unwrap();
        if self.fail_on_commit == Some(commits.len()) {
            bail!("commit {} rejected", commits.len());
        }
        commits.push(batch.len());
        let mut docs = self.docs.lock().unwrap();
        for w in batch.into_writes() {
            docs.entry(w.collection).or_default().insert(w.id, w.document);
        }
        Ok(())
    }

    async fn recursive_delete(&self, collection: &str) -> Result<usize> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .remove(collection)
            .map(|c| c.len())
            .unwrap_or(0))
    }
}
