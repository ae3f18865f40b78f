use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::{FetchError, StoreError};
use crate::repository::ObjectRepository;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-process object store keyed by `(bucket, key)`.
#[derive(Default)]
pub struct MemoryRepository {
    map: RwLock<HashMap<(String, String), StoredObject>>,
    rejected_prefixes: Vec<String>,
    gets: RwLock<usize>,
    puts: RwLock<usize>,
}

impl MemoryRepository {
    /// Refuses every upload whose key starts with `prefix`.
    pub fn rejecting_puts_under(prefix: &str) -> MemoryRepository {
        MemoryRepository {
            rejected_prefixes: vec![prefix.to_string()],
            ..MemoryRepository::default()
        }
    }

    pub async fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        let object = StoredObject {
            body,
            content_type: String::from("application/octet-stream"),
        };
        self.map
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), object);
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.map
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub async fn keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<(String, String)> = self.map.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn get_count(&self) -> usize {
        *self.gets.read().await
    }

    /// Number of put attempts, including rejected ones.
    pub async fn put_count(&self) -> usize {
        *self.puts.read().await
    }
}

impl ObjectRepository for MemoryRepository {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, PipelineError> {
        *self.gets.write().await += 1;
        let object = self.object(bucket, key).await;
        match object {
            Some(_) => debug!("Memory hit: {bucket}/{key}"),
            None => debug!("Memory miss: {bucket}/{key}"),
        }
        object.map(|o| o.body).ok_or(FetchError {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: String::from("no such object"),
        })
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PipelineError> {
        *self.puts.write().await += 1;
        if self.rejected_prefixes.iter().any(|p| key.starts_with(p)) {
            return Err(StoreError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: String::from("access denied"),
            });
        }
        let object = StoredObject {
            body,
            content_type: content_type.to_string(),
        };
        self.map
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), object);
        debug!("Memory write: {bucket}/{key}");
        Ok(format!("memory://{bucket}/{key}"))
    }
}
