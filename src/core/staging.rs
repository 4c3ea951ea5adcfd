//! Upload staging.
//!
//! Uploaded files are persisted to a request-scoped temporary location so tool
//! handlers can operate on a path rather than a stream. A [`StagedFile`] owns
//! its path and removes the file when dropped, at the end of the request.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::TempPath;
use thiserror::Error;
use tracing::{debug, instrument};

use super::config::StagingConfig;

/// An uploaded file as received from the transport.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name, if any.
    pub filename: Option<String>,
    /// The file contents.
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename,
            data: data.into(),
        }
    }

    /// A file part with neither a name nor content counts as no upload.
    pub fn is_empty(&self) -> bool {
        self.filename.as_deref().is_none_or(str::is_empty) && self.data.is_empty()
    }

    /// Extension of the client-supplied file name, if it has a sane one.
    fn extension(&self) -> Option<&str> {
        let ext = Path::new(self.filename.as_deref()?).extension()?.to_str()?;
        (!ext.is_empty() && ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .then_some(ext)
    }
}

/// A staged upload, deleted from disk on drop.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The staged path as a string, as handed to tool handlers.
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Errors that can occur while staging an upload.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create staging file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write staged upload {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Persists uploads for the duration of a request.
#[async_trait]
pub trait FileStager: Send + Sync {
    async fn stage(&self, upload: Upload) -> Result<StagedFile, StagingError>;
}

/// Stages uploads as uniquely named temporary files.
#[derive(Debug, Clone)]
pub struct TempFileStager {
    dir: PathBuf,
}

impl TempFileStager {
    pub fn new(config: &StagingConfig) -> Self {
        Self {
            dir: config.dir.clone().unwrap_or_else(std::env::temp_dir),
        }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FileStager for TempFileStager {
    #[instrument(skip_all, fields(filename = upload.filename.as_deref().unwrap_or(""), size = upload.data.len()))]
    async fn stage(&self, upload: Upload) -> Result<StagedFile, StagingError> {
        let suffix = upload.extension().map(|ext| format!(".{ext}")).unwrap_or_default();

        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&self.dir)
            .map_err(|source| StagingError::Create {
                dir: self.dir.clone(),
                source,
            })?;
        let path = file.into_temp_path();

        tokio::fs::write(&path, &upload.data)
            .await
            .map_err(|source| StagingError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Staged upload at {}", path.display());
        Ok(StagedFile { path })
    }
}
