//! Reading and validating the uploaded document.
//!
//! Checks run in a fixed order: extension, then size, then emptiness. The
//! extension is checked before any body byte is read. The body is streamed
//! into a [`TempArtifact`] with the size checked per chunk, so an invalid
//! upload never reaches the engine and a valid one is never buffered whole.

use std::path::Path;

use axum::extract::Multipart;
use media::{
    allowed_extensions_display, is_allowed_extension, normalized_extension, StagingError,
    TempArtifact,
};
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;

/// Multipart field that carries the document.
pub const FILE_FIELD: &str = "file";

/// A validated upload, staged on disk.
#[derive(Debug)]
pub struct Upload {
    /// Client-supplied name, used in logs and in place of the staged path.
    pub file_name: String,
    pub artifact: TempArtifact,
}

pub async fn read_upload(
    multipart: &mut Multipart,
    max_bytes: u64,
    staging_dir: Option<&Path>,
    request_id: Uuid,
) -> Result<Upload, ApiError> {
    let staging_failed = |e: StagingError| {
        error!(error = %e, "Failed to stage upload");
        ApiError::Internal { request_id }
    };

    // Errors here come from framing or from fields before `file`, never from
    // the document itself, so a body-limit hit is not reported as oversize.
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadMultipart(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let extension = normalized_extension(&file_name).unwrap_or_default();
        if !is_allowed_extension(&extension) {
            return Err(ApiError::InvalidFormat {
                extension,
                allowed: allowed_extensions_display(),
            });
        }

        let mut artifact =
            TempArtifact::create(staging_dir, &extension).map_err(&staging_failed)?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::from_multipart(e, max_bytes))?
        {
            if artifact.len() + chunk.len() as u64 > max_bytes {
                return Err(ApiError::FileTooLarge { max_bytes });
            }
            artifact.append(&chunk).await.map_err(&staging_failed)?;
        }
        artifact.finish().await.map_err(&staging_failed)?;

        if artifact.is_empty() {
            return Err(ApiError::EmptyFile);
        }

        return Ok(Upload {
            file_name,
            artifact,
        });
    }

    Err(ApiError::MissingFile)
}
