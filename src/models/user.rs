use bytes::Bytes;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::backend::Document;
use crate::error::AppResult;

pub const USERS_COLLECTION: &str = "users";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Same id the auth provider issued
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_picture: String,
}

impl User {
    pub fn from_document(document: Document) -> AppResult<Self> {
        let mut user: User = serde_json::from_value(document.data)?;
        user.id = document.id;
        Ok(user)
    }

    pub fn to_body(&self) -> AppResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6))]
    pub password: String,

    /// Raw bytes of the picked profile picture, compressed before upload
    pub profile_picture: Option<Bytes>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub profile_picture: Option<Bytes>,
}
