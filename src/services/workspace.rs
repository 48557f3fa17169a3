use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::TempDir;
use thiserror::Error;

use crate::utils::validation::sanitize_filename;

/// One file part of the incoming multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

/// An uploaded file persisted inside the workspace, ready for merging.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_name: String,
}

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("failed to create workspace directory: {0}")]
    Create(#[source] std::io::Error),

    #[error("failed to stage {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Request-scoped scratch directory owning all staged inputs.
///
/// The backing directory is removed recursively when the workspace is
/// dropped, on normal return, error and panic paths alike.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Result<Self, StagingError> {
        let dir = TempDir::with_prefix("pdf-merge-").map_err(StagingError::Create)?;
        Ok(Self { dir })
    }

    /// Create the workspace under a specific root instead of the system
    /// temp directory.
    pub fn create_in(root: impl AsRef<Path>) -> Result<Self, StagingError> {
        let dir = TempDir::with_prefix_in("pdf-merge-", root).map_err(StagingError::Create)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write every upload into the workspace, preserving submission order.
    ///
    /// Staged names carry a sequence prefix, so two uploads sharing a
    /// filename never collide and the merge order is visible on disk.
    /// Any single write failure fails the whole staging pass.
    pub async fn stage(&self, uploads: &[UploadedFile]) -> Result<Vec<StagedFile>, StagingError> {
        let mut staged = Vec::with_capacity(uploads.len());

        for (index, upload) in uploads.iter().enumerate() {
            let leaf = format!("{:03}-{}", index, sanitize_filename(&upload.filename));
            let path = self.dir.path().join(&leaf);

            tokio::fs::write(&path, &upload.content)
                .await
                .map_err(|source| StagingError::Write {
                    name: upload.filename.clone(),
                    source,
                })?;

            staged.push(StagedFile {
                path,
                original_name: upload.filename.clone(),
            });
        }

        Ok(staged)
    }
}
