use crate::domain::error::PipelineError;
use crate::domain::error::PipelineError::StagingError;
use futures_util::TryFutureExt;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Escapes `%` so every mapped name decodes back to exactly one segment.
const SEGMENT_SET: &AsciiSet = &CONTROLS.add(b'%').add(b'/').add(b'\\');

/// Local staging area; files live at `{root}/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct ScratchRepository {
    root: PathBuf,
}

/// A staged file, removed from disk when dropped together with any parent
/// directories it leaves empty below the scratch root.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    root: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<u8>, PipelineError> {
        tokio::fs::read(&self.path)
            .map_err(|e| {
                error!(path = %self.path.display(), error = %e, "Could not read staged file");
                staging_error(&self.path, e)
            })
            .await
    }

    fn prune_empty_parents(&self) {
        let mut dir = self.path.parent();
        while let Some(current) = dir.filter(|d| *d != self.root && d.starts_with(&self.root)) {
            if let Err(e) = std::fs::remove_dir(current) {
                if e.kind() != ErrorKind::NotFound {
                    debug!(path = %current.display(), error = %e, "Staging directory kept");
                }
                break;
            }
            dir = current.parent();
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Staged file removed"),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not remove staged file")
            }
        }
        self.prune_empty_parents();
    }
}

impl ScratchRepository {
    pub fn new(root: impl Into<PathBuf>) -> ScratchRepository {
        ScratchRepository { root: root.into() }
    }

    /// Writes `bytes` to the staging path of `bucket`/`key`, creating parent directories.
    #[instrument(skip(self, bytes))]
    pub async fn stage(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
    ) -> Result<ScratchFile, PipelineError> {
        let timer = Instant::now();
        let full_path = self.staging_path(bucket, key)?;
        let parent = full_path.parent().unwrap_or(&self.root).to_path_buf();

        create_staging_dir(&parent).await?;

        // Guard first so a partially written file is removed too.
        let scratch_file = ScratchFile {
            path: full_path,
            root: self.root.clone(),
        };
        let mut written = tokio::fs::write(scratch_file.path(), bytes).await;
        if matches!(&written, Err(e) if e.kind() == ErrorKind::NotFound) {
            // Another file's drop may have pruned the directory in between.
            create_staging_dir(&parent).await?;
            written = tokio::fs::write(scratch_file.path(), bytes).await;
        }
        written.map_err(|e| {
            error!(
                bucket,
                key,
                path = %scratch_file.path().display(),
                error = %e,
                "Could not write staged file"
            );
            staging_error(scratch_file.path(), e)
        })?;
        debug!(
            "Staging write took {} ms for {}",
            timer.elapsed().as_millis(),
            scratch_file.path().display()
        );
        Ok(scratch_file)
    }

    /// Maps `bucket`/`key` to a path below the root. Segments that would leave the
    /// root or collapse (`..`, `.`, empty) are given escaped names instead.
    fn staging_path(&self, bucket: &str, key: &str) -> Result<PathBuf, PipelineError> {
        let relative: PathBuf = std::iter::once(staging_name(bucket))
            .chain(key.split('/').map(staging_name))
            .collect();
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            error!(bucket, key, "Object key cannot be staged below the scratch root");
            return Err(StagingError {
                path: relative.display().to_string(),
                reason: String::from("key escapes the scratch root"),
            });
        }
        Ok(self.root.join(relative))
    }
}

fn staging_name(segment: &str) -> String {
    match segment {
        "" => String::from("%2F"),
        "." => String::from("%2E"),
        ".." => String::from("%2E%2E"),
        _ => utf8_percent_encode(segment, SEGMENT_SET).to_string(),
    }
}

async fn create_staging_dir(dir: &Path) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(dir)
        .map_err(|e| {
            error!(path = %dir.display(), error = %e, "Could not create staging directory");
            staging_error(dir, e)
        })
        .await
}

fn staging_error(path: &Path, e: std::io::Error) -> PipelineError {
    StagingError {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}
