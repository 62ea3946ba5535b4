use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use validator::Validate;

use super::upload::UploadSequencer;
use crate::backend::{Document, DocumentStore, Filter};
use crate::error::{AppError, AppResult};
use crate::models::{Memory, MemoryDraft, MemoryUpdate, MEMORIES_COLLECTION};
use crate::store::MemoryStore;
use crate::views;

/// Image changes that go with an edit
#[derive(Debug, Clone, Default)]
pub struct ImageEdit {
    /// New cover; `None` keeps the current cover URL
    pub cover: Option<Bytes>,
    /// New gallery; `None` keeps the current gallery URLs, `Some` replaces
    /// them with whatever uploads succeed
    pub gallery: Option<Vec<Bytes>>,
}

struct ActiveListener {
    user_id: String,
    favorites_only: bool,
    pump: JoinHandle<()>,
}

/// Keeps the active user's memories in the local store and writes changes
/// through to the document store.
pub struct MemoryService {
    documents: Arc<dyn DocumentStore>,
    uploads: UploadSequencer,
    store: MemoryStore,
    listener: Mutex<Option<ActiveListener>>,
}

impl MemoryService {
    pub fn new(documents: Arc<dyn DocumentStore>, uploads: UploadSequencer) -> Self {
        MemoryService {
            documents,
            uploads,
            store: MemoryStore::new(),
            listener: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// User the live listener is scoped to
    pub fn active_user_id(&self) -> Option<String> {
        self.lock_listener()
            .as_ref()
            .map(|listener| listener.user_id.clone())
    }

    pub fn is_subscribed(&self) -> bool {
        self.lock_listener().is_some()
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<ActiveListener>> {
        self.listener.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn require_user(&self) -> AppResult<String> {
        self.active_user_id().ok_or(AppError::NotLoggedIn)
    }

    /// Patches the local list after a write, keeping it within the live
    /// query's filter
    fn patch_local(&self, memory: &Memory) {
        let favorites_only = self
            .lock_listener()
            .as_ref()
            .map(|listener| listener.favorites_only)
            .unwrap_or(false);

        if favorites_only && !memory.is_favorite {
            self.store.remove(&memory.id);
        } else {
            self.store.upsert(memory.clone());
        }
    }

    /// Starts the live query for `user_id` and returns once the first
    /// snapshot is in the store. Every snapshot replaces the whole local
    /// list. A previous listener is torn down first.
    pub async fn subscribe(&self, user_id: &str, favorites_only: bool) -> AppResult<()> {
        self.unsubscribe();

        let mut filter = Filter::new().eq("userId", user_id);
        if favorites_only {
            filter = filter.eq("isFavorite", true);
        }
        let mut subscription = self.documents.subscribe(MEMORIES_COLLECTION, filter).await?;

        if let Some(documents) = subscription.next_snapshot().await {
            self.store.replace(decode_snapshot(documents));
        }

        let store = self.store.clone();
        let pump = tokio::spawn(async move {
            while let Some(documents) = subscription.next_snapshot().await {
                store.replace(decode_snapshot(documents));
            }
        });

        *self.lock_listener() = Some(ActiveListener {
            user_id: user_id.to_string(),
            favorites_only,
            pump,
        });
        info!(
            "Listening to memories of user {} (favorites only: {})",
            user_id, favorites_only
        );
        Ok(())
    }

    /// Stops the live query and empties the local list
    pub fn unsubscribe(&self) {
        if let Some(listener) = self.lock_listener().take() {
            listener.pump.abort();
            info!(
                "Stopped listening to memories of user {} (favorites only: {})",
                listener.user_id, listener.favorites_only
            );
        }
        self.store.clear();
    }

    /// Writes a memory whose images are already URLs
    pub async fn create(
        &self,
        draft: MemoryDraft,
        cover_image: String,
        gallery_images: Vec<String>,
    ) -> AppResult<Memory> {
        draft.validate()?;
        let user_id = self.require_user()?;

        let mut memory = draft.into_memory(&user_id, cover_image, gallery_images);
        memory.id = self
            .documents
            .create(MEMORIES_COLLECTION, memory.to_body()?)
            .await
            .map_err(|e| {
                error!("Error saving memory: {}", e);
                e
            })?;

        info!("Created memory {} for user {}", memory.id, user_id);
        self.patch_local(&memory);
        Ok(memory)
    }

    /// Uploads the cover, fans out the gallery uploads, then writes exactly
    /// one document. The returned result is the single completion signal.
    pub async fn upload_and_create(
        &self,
        draft: MemoryDraft,
        cover: Option<Bytes>,
        gallery: Vec<Bytes>,
    ) -> AppResult<Memory> {
        draft.validate()?;
        self.require_user()?;

        let images = self.uploads.upload_all(cover, gallery).await?;
        self.create(draft, images.cover_image, images.gallery_images)
            .await
    }

    /// Applies the update to the cached memory and writes it back
    pub async fn edit(&self, id: &str, update: MemoryUpdate) -> AppResult<Memory> {
        update.validate()?;
        let mut memory = self
            .store
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("memory {}", id)))?;

        memory.apply(&update);
        self.documents
            .update(MEMORIES_COLLECTION, id, memory.to_body()?)
            .await
            .map_err(|e| {
                error!("Error updating memory {}: {}", id, e);
                e
            })?;

        self.patch_local(&memory);
        Ok(memory)
    }

    /// Edit that may also replace images. Fields of `update` that carry
    /// image URLs are overwritten by the upload results.
    pub async fn upload_and_edit(
        &self,
        id: &str,
        mut update: MemoryUpdate,
        images: ImageEdit,
    ) -> AppResult<Memory> {
        update.validate()?;
        if self.store.get(id).is_none() {
            return Err(AppError::NotFound(format!("memory {}", id)));
        }

        if let Some(cover) = images.cover {
            update.cover_image = Some(self.uploads.upload_cover(Some(cover)).await?);
        }
        if let Some(gallery) = images.gallery {
            update.gallery_images = Some(self.uploads.upload_gallery(gallery).await);
        }

        self.edit(id, update).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if self.store.get(id).is_none() {
            return Err(AppError::NotFound(format!("memory {}", id)));
        }

        self.documents
            .delete(MEMORIES_COLLECTION, id)
            .await
            .map_err(|e| {
                error!("Error deleting memory {}: {}", id, e);
                e
            })?;

        self.store.remove(id);
        info!("Deleted memory {}", id);
        Ok(())
    }

    /// Flips the favorite flag. A memory that is not in the local cache is
    /// left alone and `None` is returned.
    pub async fn toggle_favorite(&self, id: &str) -> AppResult<Option<Memory>> {
        let Some(memory) = self.store.get(id) else {
            debug!("Favorite toggle for unknown memory {} ignored", id);
            return Ok(None);
        };

        let update = MemoryUpdate {
            is_favorite: Some(!memory.is_favorite),
            ..Default::default()
        };
        self.edit(id, update).await.map(Some)
    }

    /// One-shot search over all of the user's memories; does not follow
    /// later changes
    pub async fn search(&self, query: &str) -> AppResult<Vec<Memory>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let user_id = self.require_user()?;

        let documents = self
            .documents
            .query(MEMORIES_COLLECTION, &Filter::new().eq("userId", user_id))
            .await?;
        let memories = documents
            .into_iter()
            .map(Memory::from_document)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(views::search(&memories, query))
    }
}

fn decode_snapshot(documents: Vec<Document>) -> Vec<Memory> {
    let memories: Vec<Memory> = documents
        .into_iter()
        .filter_map(|document| {
            let id = document.id.clone();
            Memory::from_document(document)
                .map_err(|e| warn!("Skipping unreadable memory {}: {}", id, e))
                .ok()
        })
        .collect();
    debug!("Memory snapshot with {} entries", memories.len());
    memories
}

impl Drop for MemoryService {
    fn drop(&mut self) {
        if let Some(listener) = self.lock_listener().take() {
            listener.pump.abort();
        }
    }
}
