//! Scoped temporary files for uploaded documents.
//!
//! A [`TempArtifact`] owns its file: dropping it deletes the file, so every
//! exit path of a request (success, validation failure, engine error, or a
//! cancelled future) cleans up without an explicit call. Uploads are written
//! chunk by chunk as they arrive, so a request never holds the whole document
//! in memory.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const STAGED_PREFIX: &str = "docscan-upload-";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to create staging file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write staged upload: {0}")]
    Write(#[source] io::Error),

    #[error("staged upload is already finished")]
    Finished,
}

/// Uniquely named file holding one request's upload.
#[derive(Debug)]
pub struct TempArtifact {
    path: Option<TempPath>,
    /// Open while the upload is being written.
    file: Option<File>,
    len: u64,
}

impl TempArtifact {
    /// Create an empty `docscan-upload-<random><extension>` inside `dir`
    /// (the system temp dir when `None`).
    pub fn create(dir: Option<&Path>, extension: &str) -> Result<Self, StagingError> {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);

        let named = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(extension)
            .tempfile_in(&dir)
            .map_err(|source| StagingError::Create { dir, source })?;

        let (file, path) = named.into_parts();
        debug!(path = %path.display(), "Staging upload");
        Ok(Self {
            path: Some(path),
            file: Some(File::from_std(file)),
            len: 0,
        })
    }

    /// Append one chunk of the upload.
    pub async fn append(&mut self, bytes: &[u8]) -> Result<(), StagingError> {
        let file = self.file.as_mut().ok_or(StagingError::Finished)?;
        file.write_all(bytes).await.map_err(StagingError::Write)?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    /// Flush and close the file so another process can read it.
    pub async fn finish(&mut self) -> Result<(), StagingError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.map_err(StagingError::Write)?;
        }
        debug!(path = %self.path().display(), size = self.len, "Staged upload");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete the file now, surfacing the I/O error instead of only logging it.
    pub fn remove(mut self) -> io::Result<()> {
        self.file.take();
        match self.path.take() {
            Some(path) => path.close(),
            None => Ok(()),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        self.file.take();
        if let Some(path) = self.path.take() {
            let shown = path.display().to_string();
            if let Err(e) = path.close() {
                warn!(path = %shown, error = %e, "Failed to delete staged upload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn staged(dir: &Path, extension: &str, chunks: &[&[u8]]) -> TempArtifact {
        let mut artifact = TempArtifact::create(Some(dir), extension).unwrap();
        for chunk in chunks {
            artifact.append(chunk).await.unwrap();
        }
        artifact.finish().await.unwrap();
        artifact
    }

    #[tokio::test]
    async fn writes_chunks_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = staged(dir.path(), ".png", &[b"\x89PNG", b" fake"]).await;

        let path = artifact.path().to_path_buf();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "png");
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with(STAGED_PREFIX));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake");
        assert_eq!(artifact.len(), 9);
        assert!(!artifact.is_empty());
    }

    #[tokio::test]
    async fn drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = staged(dir.path(), ".pdf", &[b"%PDF-1.7"]).await;
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_mid_write_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = TempArtifact::create(Some(dir.path()), ".tif").unwrap();
        artifact.append(b"II*\0").await.unwrap();

        drop(artifact);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = staged(dir.path(), ".jpg", &[b"jpeg"]).await;
        let path = artifact.path().to_path_buf();

        artifact.remove().unwrap();
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn nothing_written_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = staged(dir.path(), ".jpg", &[]).await;
        assert!(artifact.is_empty());
    }

    #[tokio::test]
    async fn append_after_finish_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = staged(dir.path(), ".bmp", &[b"BM"]).await;
        let err = artifact.append(b"more").await.unwrap_err();
        assert!(matches!(err, StagingError::Finished));
        assert_eq!(artifact.len(), 2);
    }

    #[tokio::test]
    async fn artifacts_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = staged(dir.path(), ".jpg", &[b"a"]).await;
        let b = staged(dir.path(), ".jpg", &[b"b"]).await;
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn missing_directory_is_create_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = TempArtifact::create(Some(&missing), ".jpg").unwrap_err();
        assert!(matches!(err, StagingError::Create { .. }));
    }
}
