use std::path::{Path, PathBuf};

use anyhow::Context;
use image::ImageFormat;
use uuid::Uuid;

use crate::{error::ApiError, services::metrics::PHOTO_UPLOADS_COUNTER};

/// A photo written to the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    pub path: PathBuf,
    /// Public path, served from `/uploads`.
    pub url: String,
}

/// File extension for an accepted image, sniffed from its bytes.
pub fn photo_extension(bytes: &[u8]) -> Result<&'static str, ApiError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok("jpg"),
        Ok(ImageFormat::Png) => Ok("png"),
        Ok(ImageFormat::WebP) => Ok("webp"),
        Ok(ImageFormat::Gif) => Ok("gif"),
        _ => Err(ApiError::validation("photo must be a JPEG, PNG, WEBP or GIF image.")),
    }
}

pub async fn save_photo(upload_dir: &str, bytes: &[u8]) -> Result<StoredPhoto, ApiError> {
    let ext = photo_extension(bytes)?;

    let dir = Path::new(upload_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating upload dir {}", dir.display()))?;

    let filename = format!("{}.{}", Uuid::new_v4(), ext);
    let path = dir.join(&filename);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("writing photo {}", path.display()))?;

    PHOTO_UPLOADS_COUNTER.inc();
    tracing::info!("Stored medicine photo {} ({} bytes)", filename, bytes.len());

    Ok(StoredPhoto {
        path,
        url: format!("/uploads/{filename}"),
    })
}

/// Remove a photo whose medicine record was never saved.
pub async fn discard_photo(photo: &StoredPhoto) {
    if let Err(e) = tokio::fs::remove_file(&photo.path).await {
        tracing::warn!("Could not remove orphaned photo {}: {}", photo.path.display(), e);
    }
}
