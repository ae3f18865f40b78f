use crate::client::bucket_client::object_url;
use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::{FetchError, StoreError};
use crate::repository::ObjectRepository;
use tracing::{debug, error, instrument};

/// Object storage reached over plain HTTP GET/PUT at `{endpoint}/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct BucketRepository {
    client: reqwest::Client,
    endpoint: String,
}

impl BucketRepository {
    pub fn new(client: reqwest::Client, endpoint: &str) -> BucketRepository {
        BucketRepository {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl ObjectRepository for BucketRepository {
    #[instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, PipelineError> {
        let fetch_error = |reason: String| {
            error!(bucket, key, reason = %reason, "Could not download object");
            FetchError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason,
            }
        };

        let url = object_url(&self.endpoint, bucket, key);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(fetch_error(format!("status {}", resp.status())));
        }
        let bytes = resp.bytes().await.map_err(|e| fetch_error(e.to_string()))?;
        debug!(bucket, key, bytes = bytes.len(), "Object downloaded");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, body))]
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PipelineError> {
        let store_error = |reason: String| {
            error!(bucket, key, reason = %reason, "Could not upload object");
            StoreError {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason,
            }
        };

        let url = object_url(&self.endpoint, bucket, key);
        let resp = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| store_error(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(store_error(format!("status {}", resp.status())));
        }
        Ok(url)
    }
}
