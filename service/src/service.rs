use crate::client::object_store_client::ObjectStoreClient;
use crate::config::OnDecodeError;
use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::DecodeError;
use crate::domain::key::{derive_thumbnail_key, is_thumbnail_key};
use crate::domain::notification::{parse_batch, ChangeNotification};
use crate::domain::server_timing::{ServerTiming, DECODE, ENCODE, FETCH, RESIZE, STORE};
use crate::domain::size::ThumbnailSize;
use crate::image_service::{decode_image, encode_image, resample};
use crate::repository::scratch_repository::ScratchRepository;
use crate::repository::ObjectRepository;
use image::{DynamicImage, ImageFormat};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

pub type InternalResponse = Result<BatchSummary, PipelineError>;

/// Parses a pushed notification payload and runs its batch.
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn process_notification<R: ObjectRepository + Send + Sync>(
    body: &[u8],
    pipeline: &ThumbnailPipeline<R>,
) -> InternalResponse {
    let batch = parse_batch(body).inspect_err(|e| warn!(error = %e, "Rejected notification"))?;
    pipeline.process_batch(&batch).await
}

/// What a batch did. Only `records` is reported back to the caller.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub records: usize,
    pub stored: usize,
    pub failed: usize,
    pub server_timing: ServerTiming,
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} records processed", self.records)
    }
}

pub struct ThumbnailPipeline<R> {
    store: ObjectStoreClient<R>,
    sizes: Vec<ThumbnailSize>,
    on_decode_error: OnDecodeError,
}

impl<R: ObjectRepository + Send + Sync> ThumbnailPipeline<R> {
    pub fn new(
        repository: Arc<R>,
        scratch: ScratchRepository,
        sizes: Vec<ThumbnailSize>,
        on_decode_error: OnDecodeError,
    ) -> ThumbnailPipeline<R> {
        ThumbnailPipeline {
            store: ObjectStoreClient::new(repository, scratch),
            sizes,
            on_decode_error,
        }
    }

    /// Runs every record in order. Failures are logged and skipped; only an undecodable
    /// source under [`OnDecodeError::AbortBatch`] stops the batch.
    #[instrument(skip_all, fields(records = batch.len()))]
    pub async fn process_batch(
        &self,
        batch: &[ChangeNotification],
    ) -> Result<BatchSummary, PipelineError> {
        let process_timer = Instant::now();
        info!("{batch:?}");

        let mut summary = BatchSummary::default();
        for record in batch {
            match self.process_record(record, &mut summary).await {
                Ok(()) => {}
                Err(e @ DecodeError { .. })
                    if self.on_decode_error == OnDecodeError::AbortBatch =>
                {
                    error!(
                        bucket = %record.bucket,
                        key = %record.key,
                        processed = summary.records,
                        "Aborting batch on undecodable image"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        bucket = %record.bucket,
                        key = %record.key,
                        error = %e,
                        "Record skipped"
                    );
                }
            }
            summary.records += 1;
        }

        info!(
            records = summary.records,
            stored = summary.stored,
            failed = summary.failed,
            "Batch done in {} ms",
            process_timer.elapsed().as_millis()
        );
        Ok(summary)
    }

    /// Fetch and decode once, then produce every configured size.
    async fn process_record(
        &self,
        record: &ChangeNotification,
        summary: &mut BatchSummary,
    ) -> Result<(), PipelineError> {
        if is_thumbnail_key(&record.key) {
            info!(bucket = %record.bucket, key = %record.key, "Skipping derived thumbnail");
            return Ok(());
        }

        let fetch_timer = Instant::now();
        let source = self.store.fetch(&record.bucket, &record.key).await?;
        let bytes = source.read().await?;
        drop(source);
        summary.server_timing.record(FETCH, fetch_timer.elapsed());

        let decoding_timer = Instant::now();
        let (image, format) = decode_image(&record.key, &bytes)?;
        drop(bytes);
        summary.server_timing.record(DECODE, decoding_timer.elapsed());

        for size in &self.sizes {
            match self.process_variant(record, &image, format, *size, summary).await {
                Ok(location) => {
                    summary.stored += 1;
                    debug!(
                        key = %record.key,
                        size = size.px(),
                        location = %location,
                        "Thumbnail stored"
                    );
                }
                Err(_) => summary.failed += 1,
            }
        }
        Ok(())
    }

    async fn process_variant(
        &self,
        record: &ChangeNotification,
        image: &DynamicImage,
        format: ImageFormat,
        size: ThumbnailSize,
        summary: &mut BatchSummary,
    ) -> Result<String, PipelineError> {
        let resizing_timer = Instant::now();
        let canvas = resample(&record.key, image, size)?;
        summary.server_timing.record(RESIZE, resizing_timer.elapsed());

        let encoding_timer = Instant::now();
        let body = encode_image(&record.key, size, canvas, format)?;
        summary.server_timing.record(ENCODE, encoding_timer.elapsed());

        let thumb_key = derive_thumbnail_key(&record.key, size).inspect_err(|e| {
            error!(
                bucket = %record.bucket,
                key = %record.key,
                size = size.px(),
                error = ?e,
                "Could not derive thumbnail key"
            )
        })?;

        let storing_timer = Instant::now();
        let location = self
            .store
            .store(&record.bucket, &thumb_key, body, format.to_mime_type())
            .await;
        summary.server_timing.record(STORE, storing_timer.elapsed());
        location
    }
}
