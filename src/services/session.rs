use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use validator::Validate;

use super::upload::UploadSequencer;
use crate::backend::{AuthProvider, DocumentStore, StorageNamespace};
use crate::error::{AppError, AppResult};
use crate::models::{RegisterRequest, UpdateProfileRequest, User, USERS_COLLECTION};

/// Holds the signed-in user and publishes every change of it
pub struct SessionService {
    auth: Arc<dyn AuthProvider>,
    documents: Arc<dyn DocumentStore>,
    uploads: UploadSequencer,
    default_profile_picture: String,
    current: watch::Sender<Option<User>>,
}

impl SessionService {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        documents: Arc<dyn DocumentStore>,
        uploads: UploadSequencer,
        default_profile_picture: impl Into<String>,
    ) -> Self {
        let (current, _) = watch::channel(None);
        SessionService {
            auth,
            documents,
            uploads,
            default_profile_picture: default_profile_picture.into(),
            current,
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }

    async fn load_user(&self, user_id: &str) -> AppResult<User> {
        let document = self
            .documents
            .get(USERS_COLLECTION, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;
        User::from_document(document)
    }

    async fn save_profile(&self, user: &User) -> AppResult<()> {
        self.documents
            .set(USERS_COLLECTION, &user.id, user.to_body()?)
            .await
    }

    /// Creates the account, stores the profile and signs the new user in.
    /// A profile picture that fails to upload is replaced by the placeholder.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;

        let user_id = self.auth.sign_up(&request.email, &request.password).await?;

        let profile_picture = match request.profile_picture {
            Some(raw) => self
                .uploads
                .upload_image(StorageNamespace::ProfilePictures, raw)
                .await
                .unwrap_or_else(|e| {
                    warn!("Profile picture upload failed, using placeholder: {}", e);
                    self.default_profile_picture.clone()
                }),
            None => self.default_profile_picture.clone(),
        };

        let user = User {
            id: user_id.clone(),
            name: request.name,
            email: request.email.trim().to_lowercase(),
            profile_picture,
        };
        if let Err(e) = self.save_profile(&user).await {
            error!("Error saving profile of {}: {}", user_id, e);
            // An account without a profile can never log in.
            if let Err(rollback) = self.auth.delete_user(&user_id).await {
                error!("Could not remove account {}: {}", user_id, rollback);
            }
            return Err(e);
        }

        self.auth.sign_in(&request.email, &request.password).await?;
        info!("Registered user {}", user_id);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let user_id = self.auth.sign_in(email, password).await?;

        let user = match self.load_user(&user_id).await {
            Ok(user) => user,
            Err(e) => {
                error!("Signed in as {} but the profile could not be loaded: {}", user_id, e);
                self.auth.sign_out().await?;
                return Err(e);
            }
        };

        info!("User {} logged in", user_id);
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.auth.sign_out().await?;
        if let Some(user) = self.current.send_replace(None) {
            info!("User {} logged out", user.id);
        }
        Ok(())
    }

    /// Loads the user of a persisted session, if any
    pub async fn restore(&self) -> AppResult<Option<User>> {
        let Some(user_id) = self.auth.current_user_id().await? else {
            return Ok(None);
        };

        match self.load_user(&user_id).await {
            Ok(user) => {
                info!("Restored session of user {}", user_id);
                self.current.send_replace(Some(user.clone()));
                Ok(Some(user))
            }
            Err(AppError::NotFound(_)) => {
                warn!("Persisted session of {} has no profile, signing out", user_id);
                self.auth.sign_out().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_profile(&self, request: UpdateProfileRequest) -> AppResult<User> {
        request.validate()?;
        let mut user = self.current_user().ok_or(AppError::NotLoggedIn)?;

        if let Some(raw) = request.profile_picture {
            user.profile_picture = self
                .uploads
                .upload_image(StorageNamespace::ProfilePictures, raw)
                .await?;
        }
        if let Some(name) = request.name {
            user.name = name;
        }

        self.documents
            .update(USERS_COLLECTION, &user.id, user.to_body()?)
            .await?;
        self.current.send_replace(Some(user.clone()));
        Ok(user)
    }
}
