use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::types::PlacesProvider;
use crate::error::{AppError, AppResult};
use crate::models::PlacePrediction;

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<RawPrediction>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    place_id: Option<String>,
    description: String,
    structured_formatting: Option<StructuredFormatting>,
}

#[derive(Debug, Deserialize)]
struct StructuredFormatting {
    main_text: String,
    secondary_text: Option<String>,
}

impl From<RawPrediction> for PlacePrediction {
    fn from(raw: RawPrediction) -> Self {
        match raw.structured_formatting {
            Some(formatting) => PlacePrediction {
                place_id: raw.place_id,
                primary_text: formatting.main_text,
                secondary_text: formatting.secondary_text,
            },
            None => PlacePrediction {
                place_id: raw.place_id,
                primary_text: raw.description,
                secondary_text: None,
            },
        }
    }
}

fn into_predictions(response: AutocompleteResponse) -> AppResult<Vec<PlacePrediction>> {
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(response
            .predictions
            .into_iter()
            .map(PlacePrediction::from)
            .collect()),
        status => Err(AppError::ExternalServiceError(format!(
            "Place autocomplete failed with {}: {}",
            status,
            response.error_message.unwrap_or_default()
        ))),
    }
}

/// Google Places Autocomplete over HTTP
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: &str, api_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(GooglePlacesClient {
            client,
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl PlacesProvider for GooglePlacesClient {
    async fn predictions(
        &self,
        input: &str,
        session_token: &str,
    ) -> AppResult<Vec<PlacePrediction>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("input", input),
                ("sessiontoken", session_token),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Place autocomplete returned {}",
                response.status()
            )));
        }

        let body: AutocompleteResponse = response.json().await?;
        debug!(
            "Place autocomplete for '{}' returned {} predictions",
            input,
            body.predictions.len()
        );
        into_predictions(body)
    }
}
