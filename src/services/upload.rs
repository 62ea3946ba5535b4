use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::image::ImageProcessor;
use crate::backend::{ObjectStorage, StorageNamespace};
use crate::error::{AppError, AppResult};
use crate::utils::fanout::join_settled;

/// URLs produced by one upload sequence
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImages {
    pub cover_image: String,
    pub gallery_images: Vec<String>,
}

/// Compresses images and pushes them to object storage: the cover first,
/// then every gallery image concurrently behind a single join.
#[derive(Clone)]
pub struct UploadSequencer {
    storage: Arc<dyn ObjectStorage>,
    processor: ImageProcessor,
}

impl UploadSequencer {
    pub fn new(storage: Arc<dyn ObjectStorage>, processor: ImageProcessor) -> Self {
        UploadSequencer { storage, processor }
    }

    /// Compresses one image and stores it under a fresh key in `namespace`
    pub async fn upload_image(&self, namespace: StorageNamespace, raw: Bytes) -> AppResult<String> {
        let jpeg = self.processor.compress(raw).await?;
        let key = namespace.new_key();
        let url = self
            .storage
            .put(&key, jpeg, mime::IMAGE_JPEG.as_ref())
            .await?;
        debug!("Uploaded {}", key);
        Ok(url)
    }

    pub async fn upload_cover(&self, cover: Option<Bytes>) -> AppResult<String> {
        let cover = cover.ok_or(AppError::MissingImage)?;
        self.upload_image(StorageNamespace::CoverImages, cover)
            .await
            .map_err(|e| {
                error!("Error uploading cover image: {}", e);
                e
            })
    }

    /// Fans out one upload per image and joins on all of them. Failed images
    /// are logged and left out; the others keep their relative order.
    pub async fn upload_gallery(&self, gallery: Vec<Bytes>) -> Vec<String> {
        if gallery.is_empty() {
            return Vec::new();
        }

        let total = gallery.len();
        let uploads = gallery
            .into_iter()
            .map(|raw| self.upload_image(StorageNamespace::GalleryImages, raw));
        let settled = join_settled("Gallery image upload", uploads).await;

        info!(
            "Gallery upload finished: {} of {} images stored",
            settled.succeeded.len(),
            total
        );
        settled.succeeded
    }

    /// Cover must succeed before any gallery upload starts
    pub async fn upload_all(
        &self,
        cover: Option<Bytes>,
        gallery: Vec<Bytes>,
    ) -> AppResult<UploadedImages> {
        let cover_image = self.upload_cover(cover).await?;
        let gallery_images = self.upload_gallery(gallery).await;

        Ok(UploadedImages {
            cover_image,
            gallery_images,
        })
    }
}
