use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error};
use uuid::Uuid;

use crate::backend::PlacesProvider;
use crate::error::AppResult;
use crate::models::PlacePrediction;

/// Location autocomplete for the memory form. Requests of one picking
/// session share a token, which is rotated after every selection.
///
/// Only the response to the most recent request is published; a response
/// that arrives after a newer search, a selection or a clear is dropped.
pub struct PlacesService {
    provider: Arc<dyn PlacesProvider>,
    session_token: Mutex<String>,
    predictions: watch::Sender<Vec<PlacePrediction>>,
    generation: AtomicU64,
}

fn new_session_token() -> String {
    Uuid::new_v4().to_string()
}

impl PlacesService {
    pub fn new(provider: Arc<dyn PlacesProvider>) -> Self {
        let (predictions, _) = watch::channel(Vec::new());
        PlacesService {
            provider,
            session_token: Mutex::new(new_session_token()),
            predictions,
            generation: AtomicU64::new(0),
        }
    }

    fn token(&self) -> std::sync::MutexGuard<'_, String> {
        self.session_token
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn session_token(&self) -> String {
        self.token().clone()
    }

    pub fn predictions(&self) -> Vec<PlacePrediction> {
        self.predictions.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<PlacePrediction>> {
        self.predictions.subscribe()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn search(&self, text: &str) -> AppResult<Vec<PlacePrediction>> {
        let text = text.trim();
        if text.is_empty() {
            self.clear();
            return Ok(Vec::new());
        }

        let generation = self.next_generation();
        let token = self.session_token();
        let predictions = self
            .provider
            .predictions(text, &token)
            .await
            .map_err(|e| {
                error!("Place autocomplete for {:?} failed: {}", text, e);
                e
            })?;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Dropping outdated place predictions for {:?}", text);
            return Ok(predictions);
        }

        debug!("{} place predictions for {:?}", predictions.len(), text);
        self.predictions.send_replace(predictions.clone());
        Ok(predictions)
    }

    /// Returns the location string to store and ends the picking session
    pub fn select(&self, prediction: &PlacePrediction) -> String {
        *self.token() = new_session_token();
        self.clear();
        prediction.full_text()
    }

    pub fn clear(&self) {
        self.next_generation();
        self.predictions.send_replace(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingProvider {
        tokens: Mutex<Vec<String>>,
        fail: bool,
        /// Per-input response delay in milliseconds
        delays: Vec<(&'static str, u64)>,
    }

    #[async_trait]
    impl PlacesProvider for RecordingProvider {
        async fn predictions(
            &self,
            input: &str,
            session_token: &str,
        ) -> AppResult<Vec<PlacePrediction>> {
            self.tokens.lock().unwrap().push(session_token.to_string());
            if let Some((_, millis)) = self.delays.iter().find(|(text, _)| *text == input) {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            if self.fail {
                return Err(AppError::ExternalServiceError("REQUEST_DENIED".to_string()));
            }
            Ok(vec![PlacePrediction {
                place_id: Some("p1".to_string()),
                primary_text: input.to_string(),
                secondary_text: Some("Germany".to_string()),
            }])
        }
    }

    #[tokio::test]
    async fn test_search_shares_token_until_selection() {
        let provider = Arc::new(RecordingProvider::default());
        let service = PlacesService::new(provider.clone());

        service.search("Ber").await.unwrap();
        let hits = service.search("Berlin").await.unwrap();
        assert_eq!(service.predictions(), hits);

        let location = service.select(&hits[0]);
        assert_eq!(location, "Berlin, Germany");
        assert!(service.predictions().is_empty());

        service.search("Bonn").await.unwrap();
        let tokens = provider.tokens.lock().unwrap().clone();
        assert_eq!(tokens[0], tokens[1]);
        assert_ne!(tokens[1], tokens[2]);
    }

    #[tokio::test]
    async fn test_empty_text_clears_without_request() {
        let provider = Arc::new(RecordingProvider::default());
        let service = PlacesService::new(provider.clone());

        service.search("Ham").await.unwrap();
        assert!(service.search("   ").await.unwrap().is_empty());
        assert!(service.predictions().is_empty());
        assert_eq!(provider.tokens.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_propagated() {
        let provider = Arc::new(RecordingProvider {
            fail: true,
            ..Default::default()
        });
        let service = PlacesService::new(provider);

        let err = service.search("Kiel").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }

    #[tokio::test]
    async fn test_slow_earlier_response_does_not_replace_newer_one() {
        let provider = Arc::new(RecordingProvider {
            delays: vec![("Ber", 100), ("Berlin", 10)],
            ..Default::default()
        });
        let service = PlacesService::new(provider);

        let (early, late) = tokio::join!(service.search("Ber"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            service.search("Berlin").await
        });

        assert_eq!(early.unwrap()[0].primary_text, "Ber");
        assert_eq!(late.unwrap()[0].primary_text, "Berlin");
        let published = service.predictions();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].primary_text, "Berlin");
    }

    #[tokio::test]
    async fn test_response_after_selection_is_dropped() {
        let provider = Arc::new(RecordingProvider {
            delays: vec![("Hamb", 50)],
            ..Default::default()
        });
        let service = PlacesService::new(provider);
        let picked = PlacePrediction {
            place_id: None,
            primary_text: "Hamburg".to_string(),
            secondary_text: Some("Germany".to_string()),
        };

        let (pending, location) = tokio::join!(service.search("Hamb"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            service.select(&picked)
        });

        assert!(pending.is_ok());
        assert_eq!(location, "Hamburg, Germany");
        assert!(service.predictions().is_empty());
    }
}
