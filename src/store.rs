use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Firestore refuses commits with more than 500 writes.
pub const MAX_BATCH_WRITES: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct SetWrite {
    pub collection: String,
    pub id: String,
    pub document: Value,
}

/// Full-document overwrites committed together.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<SetWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, collection: &str, id: &str, document: &T) -> Result<()> {
        if self.writes.len() >= MAX_BATCH_WRITES {
            bail!("write batch is full ({} writes)", MAX_BATCH_WRITES);
        }
        let document = serde_json::to_value(document)
            .with_context(|| format!("serializing {}/{}", collection, id))?;
        self.writes.push(SetWrite {
            collection: collection.to_string(),
            id: id.to_string(),
            document,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[SetWrite] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<SetWrite> {
        self.writes
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Apply every write of the batch as one unit.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Delete every document of `collection`, returning how many were removed.
    async fn recursive_delete(&self, collection: &str) -> Result<usize>;
}

/// Local snapshot: `<root>/<collection>/<id>.json`.
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn doc_path(&self, collection: &str, id: &str) -> PathBuf {
        self.root.join(collection).join(format!("{}.json", id))
    }

    fn stage(&self, w: &SetWrite) -> Result<(PathBuf, PathBuf)> {
        let dir = self.root.join(&w.collection);
        fs::create_dir_all(&dir).with_context(|| format!("create {:?}", dir))?;
        let path = self.doc_path(&w.collection, &w.id);
        let tmp = path.with_extension("json.tmp");
        write_json(&tmp, &w.document).with_context(|| format!("write {:?}", tmp))?;
        Ok((tmp, path))
    }
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_vec_pretty(value)?)
        .map(|_| ())
        .map_err(|e| e.into())
}

#[async_trait]
impl DocumentStore for JsonDirStore {
    /// Every document is staged as `<id>.json.tmp` first; nothing is renamed into place
    /// unless the whole batch staged. A failing rename can still leave a partial batch.
    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(batch.len());
        for w in batch.writes() {
            match self.stage(w) {
                Ok(pair) => staged.push(pair),
                Err(e) => {
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(e);
                }
            }
        }
        for (tmp, path) in &staged {
            fs::rename(tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
        }
        debug!("Local batch written - writes={}, root={}", batch.len(), self.root.display());
        Ok(())
    }

    async fn recursive_delete(&self, collection: &str) -> Result<usize> {
        let dir = self.root.join(collection);
        if !dir.exists() {
            return Ok(0);
        }
        let count = fs::read_dir(&dir)
            .with_context(|| format!("read {:?}", dir))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count();
        fs::remove_dir_all(&dir).with_context(|| format!("remove {:?}", dir))?;
        Ok(count)
    }
}
