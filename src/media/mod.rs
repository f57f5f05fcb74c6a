//! Portfolio image uploads.
//!
//! Images are stored as-is under a random name in a publicly served directory.
//! No resizing, no deduplication and no cleanup when a project is deleted.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Accepted content types and the extension used when the upload has none
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid file type. Only JPEG, PNG, and WebP are allowed.")]
    UnsupportedType(String),

    #[error("File size exceeds {limit_mb}MB limit")]
    TooLarge { size: usize, limit_mb: usize },

    #[error("File is empty")]
    Empty,

    #[error("Failed to store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    /// Public URL to put into a project's `images`
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    url_prefix: String,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>, max_bytes: usize) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            dir: dir.into(),
            url_prefix,
            max_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.dir.clone(), config.url_prefix.clone(), config.max_bytes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Reject a declared content type before the body is read
    pub fn check_type(&self, content_type: &str) -> Result<(), MediaError> {
        match canonical_extension(content_type) {
            Some(_) => Ok(()),
            None => Err(MediaError::UnsupportedType(content_type.to_string())),
        }
    }

    /// Check type and size without touching the disk
    pub fn validate(&self, content_type: &str, size: usize) -> Result<(), MediaError> {
        self.check_type(content_type)?;
        if size == 0 {
            return Err(MediaError::Empty);
        }
        if size > self.max_bytes {
            return Err(MediaError::TooLarge {
                size,
                limit_mb: self.max_bytes / (1024 * 1024),
            });
        }
        Ok(())
    }

    pub async fn save(
        &self,
        original_name: Option<&str>,
        content_type: &str,
        data: &[u8],
    ) -> Result<StoredImage, MediaError> {
        self.validate(content_type, data.len())?;

        let canonical = canonical_extension(content_type)
            .ok_or_else(|| MediaError::UnsupportedType(content_type.to_string()))?;
        let extension = original_name
            .and_then(safe_extension)
            .filter(|ext| extension_matches(ext, canonical))
            .unwrap_or_else(|| canonical.to_string());
        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.dir.join(&filename);

        let io_err = |source| MediaError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        tokio::fs::write(&path, data).await.map_err(io_err)?;

        info!(filename = %filename, size = data.len(), content_type = %content_type, "Image uploaded");

        Ok(StoredImage {
            url: format!("{}/{}", self.url_prefix, filename),
            filename,
        })
    }
}

fn canonical_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Whether a client extension agrees with the declared type's canonical extension
fn extension_matches(ext: &str, canonical: &str) -> bool {
    ext == canonical || (canonical == "jpg" && ext == "jpeg")
}

/// Extension of the client-supplied filename, if it is short and alphanumeric
fn safe_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
