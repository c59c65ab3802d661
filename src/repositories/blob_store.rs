use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::errors::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the key it was stored at.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String>;
}

/// Archives blobs as files below a root directory. The content type is kept
/// next to the blob in a `.content-type` sidecar.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        if key.is_empty() || !is_plain {
            return Err(AppError::ValidationError(format!(
                "Invalid blob key '{}'",
                key
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, &bytes).await?;

        let mut sidecar = path.into_os_string();
        sidecar.push(".content-type");
        tokio::fs::write(PathBuf::from(sidecar), content_type).await?;

        log::debug!("Archived {} bytes at {}", bytes.len(), key);
        Ok(key.to_string())
    }
}

/// Archive key for an uploaded source document: the local part of the
/// uploader's email, then the file name.
pub fn source_document_key(uploader_email: &str, file_name: &str) -> String {
    let prefix = uploader_email.split('@').next().unwrap_or(uploader_email);
    format!("{}/{}", prefix, file_name)
}
