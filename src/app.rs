use tracing::info;

use crate::backend::{BackendFactory, Backends};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{RegisterRequest, User};
use crate::services::{
    ImagePolicy, ImageProcessor, MapService, MemoryService, PlacesService, SessionService,
    UploadSequencer,
};

/// Wires the services together and keeps the memory listener in step with
/// the signed-in user.
pub struct MemoryLaneApp {
    config: Config,
    session: SessionService,
    memories: MemoryService,
    places: Option<PlacesService>,
    maps: Option<MapService>,
}

impl MemoryLaneApp {
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let backends = BackendFactory::from_config(&config).await?;
        Ok(Self::new(config, backends))
    }

    pub fn new(config: Config, backends: Backends) -> Self {
        let uploads = UploadSequencer::new(
            backends.storage.clone(),
            ImageProcessor::new(ImagePolicy::from_config(&config)),
        );

        MemoryLaneApp {
            session: SessionService::new(
                backends.auth.clone(),
                backends.documents.clone(),
                uploads.clone(),
                config.default_profile_picture_url.clone(),
            ),
            memories: MemoryService::new(backends.documents.clone(), uploads),
            places: backends.places.map(PlacesService::new),
            maps: backends.geocoder.map(MapService::new),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionService {
        &self.session
    }

    pub fn memories(&self) -> &MemoryService {
        &self.memories
    }

    /// `None` without a Google API key
    pub fn places(&self) -> Option<&PlacesService> {
        self.places.as_ref()
    }

    pub fn maps(&self) -> Option<&MapService> {
        self.maps.as_ref()
    }

    async fn attach(&self, user: &User) -> AppResult<()> {
        self.memories.subscribe(&user.id, false).await
    }

    /// Picks up a persisted session and starts listening to its memories
    pub async fn restore(&self) -> AppResult<Option<User>> {
        self.memories.unsubscribe();
        let user = self.session.restore().await?;
        if let Some(user) = &user {
            self.attach(user).await?;
        }
        Ok(user)
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        self.memories.unsubscribe();
        let user = self.session.register(request).await?;
        self.attach(&user).await?;
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        self.memories.unsubscribe();
        let user = self.session.login(email, password).await?;
        self.attach(&user).await?;
        Ok(user)
    }

    /// Signs out first; the memory list is only dropped once that succeeded
    pub async fn logout(&self) -> AppResult<()> {
        self.session.logout().await?;
        self.memories.unsubscribe();
        info!("Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AuthProvider, SqlAuthProvider};
    use crate::db::Database;
    use crate::error::AppError;
    use crate::models::{Category, MemoryDraft};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// SQLite accounts whose sign-out can be made to fail
    struct StickyAuth {
        inner: SqlAuthProvider,
        fail_sign_out: AtomicBool,
    }

    #[async_trait]
    impl AuthProvider for StickyAuth {
        async fn sign_up(&self, email: &str, password: &str) -> AppResult<String> {
            self.inner.sign_up(email, password).await
        }

        async fn sign_in(&self, email: &str, password: &str) -> AppResult<String> {
            self.inner.sign_in(email, password).await
        }

        async fn sign_out(&self) -> AppResult<()> {
            if self.fail_sign_out.load(Ordering::SeqCst) {
                return Err(AppError::ExternalServiceError("offline".to_string()));
            }
            self.inner.sign_out().await
        }

        async fn current_user_id(&self) -> AppResult<Option<String>> {
            self.inner.current_user_id().await
        }

        async fn delete_user(&self, user_id: &str) -> AppResult<()> {
            self.inner.delete_user(user_id).await
        }
    }

    async fn app(dir: &tempfile::TempDir) -> MemoryLaneApp {
        let mut config = Config::from_env().unwrap();
        config.storage_dir = dir.path().to_string_lossy().into_owned();
        config.google_api_key = None;

        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let backends = BackendFactory::create(&config, db).unwrap();
        MemoryLaneApp::new(config, backends)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Jo".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            profile_picture: None,
        }
    }

    fn draft(title: &str) -> MemoryDraft {
        MemoryDraft {
            category: Category::Family,
            title: title.to_string(),
            description: "Sunday lunch".to_string(),
            date: Utc::now(),
            location: "Leipzig".to_string(),
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn test_switching_users_swaps_memory_lists() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        assert!(app.places().is_none());
        assert!(app.maps().is_none());

        app.register(register_request("a@test.de")).await.unwrap();
        app.memories()
            .create(draft("A's memory"), "https://c".to_string(), Vec::new())
            .await
            .unwrap();
        assert_eq!(app.memories().store().snapshot().count(), 1);

        app.logout().await.unwrap();
        assert!(!app.memories().is_subscribed());
        assert_eq!(app.memories().store().snapshot().count(), 0);

        let b = app.register(register_request("b@test.de")).await.unwrap();
        assert_eq!(app.memories().active_user_id(), Some(b.id));
        assert_eq!(app.memories().store().snapshot().count(), 0);

        let a = app.login("a@test.de", "secret1").await.unwrap();
        assert_eq!(app.memories().active_user_id(), Some(a.id));
        let state = app.memories().store().snapshot();
        assert_eq!(state.count(), 1);
        assert_eq!(state.memories[0].title, "A's memory");
    }

    #[tokio::test]
    async fn test_restore_reattaches_listener() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        assert!(app.restore().await.unwrap().is_none());

        let user = app.register(register_request("c@test.de")).await.unwrap();
        let restored = app.restore().await.unwrap().unwrap();
        assert_eq!(restored.id, user.id);
        assert!(app.memories().is_subscribed());
    }

    #[tokio::test]
    async fn test_failed_login_leaves_no_listener() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let err = app.login("nobody@test.de", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        assert!(!app.memories().is_subscribed());
        assert!(app.session().current_user().is_none());
    }

    #[tokio::test]
    async fn test_failed_sign_out_keeps_session_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_env().unwrap();
        config.storage_dir = dir.path().to_string_lossy().into_owned();
        config.google_api_key = None;

        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let auth = Arc::new(StickyAuth {
            inner: SqlAuthProvider::new(db.clone()),
            fail_sign_out: AtomicBool::new(false),
        });
        let mut backends = BackendFactory::create(&config, db).unwrap();
        backends.auth = auth.clone() as Arc<dyn AuthProvider>;
        let app = MemoryLaneApp::new(config, backends);

        app.register(register_request("d@test.de")).await.unwrap();
        app.memories()
            .create(draft("Kept"), "https://c".to_string(), Vec::new())
            .await
            .unwrap();

        auth.fail_sign_out.store(true, Ordering::SeqCst);
        let err = app.logout().await.unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
        assert!(app.session().current_user().is_some());
        assert!(app.memories().is_subscribed());
        assert_eq!(app.memories().store().snapshot().count(), 1);

        auth.fail_sign_out.store(false, Ordering::SeqCst);
        app.logout().await.unwrap();
        assert!(app.session().current_user().is_none());
        assert_eq!(app.memories().store().snapshot().count(), 0);
    }
}
