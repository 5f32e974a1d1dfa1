//! Uploaded image persistence

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use camino::Utf8PathBuf;
use creaturedex_utils::atomic_write::write_bytes_atomic;
use tracing::debug;
use uuid::Uuid;

use crate::StoreError;

/// Raw image bytes plus their media type (e.g. `image/png`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ImageInput {
    #[must_use]
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Media type for an image path, judged by its extension.
#[must_use]
pub fn media_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// File extension used when storing an image of `media_type`
#[must_use]
pub fn extension_for_media_type(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist the image and return where it was stored.
    async fn save(&self, image: &ImageInput) -> Result<String, StoreError>;
}

/// Writes each image to `<upload_dir>/<uuid>.<ext>`
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    upload_dir: Utf8PathBuf,
}

impl LocalImageStore {
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if `upload_dir` is not valid UTF-8.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let upload_dir = Utf8PathBuf::from_path_buf(upload_dir.into()).map_err(|path| {
            StoreError::Backend(format!(
                "Upload directory is not valid UTF-8: {}",
                path.display()
            ))
        })?;
        Ok(Self { upload_dir })
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, image: &ImageInput) -> Result<String, StoreError> {
        let file_name = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension_for_media_type(&image.media_type)
        );
        let path = self.upload_dir.join(file_name);
        let bytes = image.bytes.clone();

        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || write_bytes_atomic(&target, &bytes))
            .await
            .map_err(|e| StoreError::Backend(format!("Task join error: {e}")))?
            .map_err(|e| StoreError::Backend(format!("Failed to write image {path}: {e:#}")))?;

        for warning in &result.warnings {
            debug!(path = %path, warning = %warning, "Image write warning");
        }
        debug!(path = %path, bytes = result.bytes_written, "Saved uploaded image");

        Ok(path.into_string())
    }
}
