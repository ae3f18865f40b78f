use crate::domain::error::PipelineError;
use crate::repository::scratch_repository::{ScratchFile, ScratchRepository};
use crate::repository::ObjectRepository;
use std::sync::Arc;
use tracing::{info, instrument};

/// Moves objects between the remote store and the local staging area.
pub struct ObjectStoreClient<R> {
    repository: Arc<R>,
    scratch: ScratchRepository,
}

impl<R: ObjectRepository + Send + Sync> ObjectStoreClient<R> {
    pub fn new(repository: Arc<R>, scratch: ScratchRepository) -> ObjectStoreClient<R> {
        ObjectStoreClient {
            repository,
            scratch,
        }
    }

    /// Downloads `bucket`/`key` into a staged file owned by the caller.
    #[instrument(skip(self))]
    pub async fn fetch(&self, bucket: &str, key: &str) -> Result<ScratchFile, PipelineError> {
        let bytes = self.repository.get_object(bucket, key).await?;
        let staged = self.scratch.stage(bucket, key, &bytes).await?;
        info!(
            bucket,
            key,
            filename = %staged.path().display(),
            bytes = bytes.len(),
            "file downloaded"
        );
        Ok(staged)
    }

    /// Stages `body` locally and uploads it from there; the staged copy is gone on return.
    #[instrument(skip(self, body))]
    pub async fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PipelineError> {
        let staged = self.scratch.stage(bucket, key, &body).await?;
        drop(body);
        let upload = staged.read().await?;
        let location = self
            .repository
            .put_object(bucket, key, upload, content_type)
            .await?;
        info!(bucket, key, location = %location, "file uploaded");
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::PipelineError::{FetchError, StoreError};
    use crate::repository::memory_repository::MemoryRepository;

    fn client(
        root: &std::path::Path,
        repository: MemoryRepository,
    ) -> (ObjectStoreClient<MemoryRepository>, Arc<MemoryRepository>) {
        let repository = Arc::new(repository);
        let client = ObjectStoreClient::new(repository.clone(), ScratchRepository::new(root));
        (client, repository)
    }

    #[tokio::test]
    async fn fetch_stages_source_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let (client, repository) = client(dir.path(), MemoryRepository::default());
        repository.insert("uploads", "image/png/a.png", b"png".to_vec()).await;

        let staged = client.fetch("uploads", "image/png/a.png").await.unwrap();
        assert_eq!(staged.path(), dir.path().join("uploads/image/png/a.png"));
        assert_eq!(staged.read().await.unwrap(), b"png");
    }

    #[tokio::test]
    async fn fetch_missing_object_fails_without_staging() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _) = client(dir.path(), MemoryRepository::default());

        assert!(matches!(
            client.fetch("uploads", "image/png/missing.png").await,
            Err(FetchError { .. })
        ));
        assert!(!dir.path().join("uploads/image/png/missing.png").exists());
    }

    #[tokio::test]
    async fn fetch_keeps_parent_segments_inside_staging() {
        let dir = tempfile::tempdir().unwrap();
        let (client, repository) = client(dir.path(), MemoryRepository::default());
        repository.insert("uploads", "../escape.png", b"png".to_vec()).await;

        let staged = client.fetch("uploads", "../escape.png").await.unwrap();
        assert_eq!(staged.path(), dir.path().join("uploads/%2E%2E/escape.png"));
        assert_eq!(staged.read().await.unwrap(), b"png");
        drop(staged);
        assert!(!dir.path().join("escape.png").exists());
    }

    #[tokio::test]
    async fn store_uploads_and_cleans_staging() {
        let dir = tempfile::tempdir().unwrap();
        let (client, repository) = client(dir.path(), MemoryRepository::default());

        let location = client
            .store("uploads", "thumb/200/a.png", b"thumb".to_vec(), "image/png")
            .await
            .unwrap();

        assert_eq!(location, "memory://uploads/thumb/200/a.png");
        let stored = repository.object("uploads", "thumb/200/a.png").await.unwrap();
        assert_eq!(stored.body, b"thumb");
        assert_eq!(stored.content_type, "image/png");
        assert!(!dir.path().join("uploads/thumb/200/a.png").exists());
    }

    #[tokio::test]
    async fn store_rejection_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _) = client(dir.path(), MemoryRepository::rejecting_puts_under("thumb/"));

        assert!(matches!(
            client
                .store("uploads", "thumb/200/a.png", b"thumb".to_vec(), "image/png")
                .await,
            Err(StoreError { .. })
        ));
        assert!(!dir.path().join("uploads/thumb/200/a.png").exists());
    }
}
