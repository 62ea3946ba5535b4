use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::models::{Coordinate, PlacePrediction};

/// A stored JSON body together with the key the store knows it by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
}

/// Conjunction of field equality conditions over top-level document fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, serde_json::Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<serde_json::Value>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, data: &serde_json::Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| data.get(field) == Some(expected))
    }
}

/// Live query handle. Each received item is the complete current result set.
/// Dropping the handle stops the server-side listener.
pub struct Subscription {
    snapshots: mpsc::UnboundedReceiver<Vec<Document>>,
    listener: JoinHandle<()>,
}

impl Subscription {
    pub fn new(snapshots: mpsc::UnboundedReceiver<Vec<Document>>, listener: JoinHandle<()>) -> Self {
        Self {
            snapshots,
            listener,
        }
    }

    /// Next full snapshot, `None` once the listener has stopped
    pub async fn next_snapshot(&mut self) -> Option<Vec<Document>> {
        self.snapshots.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// Email/password identity provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Creates an account and returns its user id
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String>;

    /// Starts a session and returns the user id
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<String>;

    async fn sign_out(&self) -> AppResult<()>;

    /// User id of the persisted session, if any
    async fn current_user_id(&self) -> AppResult<Option<String>>;

    /// Removes the account and any session it holds
    async fn delete_user(&self, user_id: &str) -> AppResult<()>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document under a fresh id and returns that id
    async fn create(&self, collection: &str, data: serde_json::Value) -> AppResult<String>;

    /// Inserts or overwrites the document with the given id
    async fn set(&self, collection: &str, id: &str, data: serde_json::Value) -> AppResult<()>;

    /// Overwrites an existing document, `NotFound` if it is gone
    async fn update(&self, collection: &str, id: &str, data: serde_json::Value) -> AppResult<()>;

    /// Removes an existing document, `NotFound` if it is gone
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    /// One-shot query
    async fn query(&self, collection: &str, filter: &Filter) -> AppResult<Vec<Document>>;

    /// Live query: pushes the matching set now and after every change
    async fn subscribe(&self, collection: &str, filter: Filter) -> AppResult<Subscription>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores the bytes under `key` and returns the public URL
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String>;
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn predictions(&self, input: &str, session_token: &str)
        -> AppResult<Vec<PlacePrediction>>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` when the address does not resolve to any place
    async fn geocode(&self, address: &str) -> AppResult<Option<Coordinate>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_matches_all_conditions() {
        let filter = Filter::new().eq("userId", "u1").eq("isFavorite", true);

        assert!(filter.matches(&json!({"userId": "u1", "isFavorite": true, "title": "x"})));
        assert!(!filter.matches(&json!({"userId": "u1", "isFavorite": false})));
        assert!(!filter.matches(&json!({"userId": "u2", "isFavorite": true})));
        assert!(!filter.matches(&json!({"isFavorite": true})));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::new().matches(&json!({"anything": 1})));
    }
}
