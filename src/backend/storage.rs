use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use super::types::ObjectStorage;
use crate::error::{AppError, AppResult};

/// Top-level folders that keep the different kinds of uploads apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageNamespace {
    CoverImages,
    GalleryImages,
    ProfilePictures,
}

impl StorageNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageNamespace::CoverImages => "cover_images",
            StorageNamespace::GalleryImages => "gallery_images",
            StorageNamespace::ProfilePictures => "profile_pictures",
        }
    }

    /// Fresh collision-free key for a JPEG inside this namespace
    pub fn new_key(&self) -> String {
        format!("{}/{}.jpg", self.as_str(), Uuid::new_v4())
    }
}

/// Object storage backed by a directory on disk
pub struct LocalObjectStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        LocalObjectStorage {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_path(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(AppError::Storage(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }

    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let size = bytes.len();
        tokio::fs::write(&path, bytes).await?;
        debug!("Stored {} ({} bytes, {})", key, size, content_type);

        Ok(self.public_url_for(key))
    }
}
