/// Photo storage - keeps uploaded artist photos on local disk
use crate::error::{Result, ServerError};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tattmap_core::UserId;
use tokio::fs;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/avif",
];

/// Location of a stored photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPhoto {
    pub key: String,
    pub public_url: String,
}

/// Object storage for artist photos
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Store one original upload under the owner's prefix
    async fn store(&self, owner: &UserId, file_name: &str, data: Bytes) -> Result<StoredPhoto>;

    /// Remove everything stored for `owner`. A missing prefix is not an error.
    async fn delete_all_for_user(&self, owner: &UserId) -> Result<()>;
}

/// Reject uploads that are not images or are too large
pub fn validate_upload(content_type: &str, size: usize) -> Result<()> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
        return Err(ServerError::UnsupportedMediaType(format!(
            "{content_type} is not an accepted image type"
        )));
    }

    if size == 0 {
        return Err(ServerError::BadRequest("Empty file".to_string()));
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(ServerError::PayloadTooLarge(format!(
            "File exceeds {MAX_UPLOAD_BYTES} bytes"
        )));
    }

    Ok(())
}

/// Make an uploaded file name safe to use as a path segment
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct LocalPhotoStorage {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalPhotoStorage {
    pub fn new(base_path: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create the storage root
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Filesystem path for a storage key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn owner_dir(&self, owner: &UserId) -> Result<PathBuf> {
        // ids come from tokens; only UUIDs may become directory names
        let owner = UserId::parse(owner.as_str())
            .map_err(|_| ServerError::BadRequest("Invalid owner id".to_string()))?;
        Ok(self.base_path.join(owner.as_str()))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn store(&self, owner: &UserId, file_name: &str, data: Bytes) -> Result<StoredPhoto> {
        let dir = self.owner_dir(owner)?.join("originals");
        fs::create_dir_all(&dir).await?;

        let stored_name = format!(
            "{}_{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize_file_name(file_name)
        );
        fs::write(dir.join(&stored_name), &data).await?;

        let key = format!("{}/originals/{}", owner.as_str(), stored_name);
        tracing::debug!(key = %key, bytes = data.len(), "Photo stored");

        Ok(StoredPhoto {
            public_url: self.public_url(&key),
            key,
        })
    }

    async fn delete_all_for_user(&self, owner: &UserId) -> Result<()> {
        let dir = self.owner_dir(owner)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServerError::Storage(format!(
                "Failed to delete photos for {}: {}",
                owner, e
            ))),
        }
    }
}
