use crate::domain::error::PipelineError;
use std::future::Future;

pub(crate) mod bucket_repository;
#[cfg(test)]
pub(crate) mod memory_repository;
pub(crate) mod scratch_repository;

/// Remote object storage, addressed by bucket and key.
pub trait ObjectRepository {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<Vec<u8>, PipelineError>> + Send;

    /// Writes (or overwrites) an object and returns its location.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> impl Future<Output = Result<String, PipelineError>> + Send;
}
