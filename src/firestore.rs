//! Cloud Firestore over its REST API.
//!
//! Only the two operations the job needs: atomic batched overwrites through
//! `documents:commit`, and deleting a whole collection.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::google_auth::{FirestoreSettings, TokenProvider};
use crate::store::{DocumentStore, WriteBatch, MAX_BATCH_WRITES};

pub const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: usize = 300;

pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    tokens: TokenProvider,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<DocumentName>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentName {
    name: String,
}

impl FirestoreStore {
    pub fn new(settings: FirestoreSettings) -> Result<Self> {
        Self::with_base_url(settings, FIRESTORE_BASE_URL)
    }

    pub fn with_base_url(settings: FirestoreSettings, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            tokens: TokenProvider::new(client.clone(), settings.credentials),
            client,
            base_url: base_url.into(),
            project_id: settings.project_id,
        })
    }

    fn database(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    fn doc_name(&self, collection: &str, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database(), collection, id)
    }

    async fn commit_writes(&self, writes: Vec<Value>) -> Result<()> {
        let count = writes.len();
        let url = format!("{}/{}/documents:commit", self.base_url, self.database());
        let token = self.tokens.token().await?;
        let start = std::time::Instant::now();

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "writes": writes }))
            .send()
            .await
            .context("Firestore commit request failed")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Firestore commit of {} writes failed with {}: {}", count, status, text);
        }

        debug!(
            "Firestore commit completed - writes={}, duration={:.2}s",
            count,
            start.elapsed().as_secs_f32()
        );
        Ok(())
    }

    async fn list_document_names(&self, collection: &str) -> Result<Vec<String>> {
        let url = format!("{}/{}/documents/{}", self.base_url, self.database(), collection);
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = self.tokens.token().await?;
            let mut req = self
                .client
                .get(&url)
                .bearer_auth(token)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string()), ("mask.fieldPaths", "__name__".to_string())]);
            if let Some(t) = &page_token {
                req = req.query(&[("pageToken", t)]);
            }

            let resp = req
                .send()
                .await
                .with_context(|| format!("listing {} failed", collection))?;
            if !resp.status().is_success() {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                bail!("listing {} failed with {}: {}", collection, status, text);
            }
            let page: ListDocumentsResponse = resp
                .json()
                .await
                .with_context(|| format!("decoding document list for {}", collection))?;

            names.extend(page.documents.into_iter().map(|d| d.name));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let writes: Vec<Value> = batch
            .into_writes()
            .into_iter()
            .map(|w| {
                json!({
                    "update": {
                        "name": self.doc_name(&w.collection, &w.id),
                        "fields": to_fields(&w.document),
                    }
                })
            })
            .collect();
        self.commit_writes(writes).await
    }

    async fn recursive_delete(&self, collection: &str) -> Result<usize> {
        let names = self.list_document_names(collection).await?;
        for chunk in names.chunks(MAX_BATCH_WRITES) {
            let writes = chunk.iter().map(|name| json!({ "delete": name })).collect();
            self.commit_writes(writes).await?;
        }
        info!("Deleted all documents from collection - collection={}, documents={}", collection, names.len());
        Ok(names.len())
    }
}

/// Top-level document fields. Non-object documents are stored under a single `value` field.
pub fn to_fields(doc: &Value) -> Value {
    match doc {
        Value::Object(map) => Value::Object(encode_map(map)),
        other => json!({ "value": to_firestore_value(other) }),
    }
}

fn encode_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), to_firestore_value(v)))
        .collect()
}

/// Encode plain JSON as a Firestore typed `Value`.
pub fn to_firestore_value(v: &Value) -> Value {
    match v {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or(0.0) })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_map(map) } }),
    }
}
