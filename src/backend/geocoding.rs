use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::types::Geocoder;
use crate::error::{AppError, AppResult};
use crate::models::Coordinate;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

fn first_coordinate(response: GeocodeResponse) -> AppResult<Option<Coordinate>> {
    match response.status.as_str() {
        "OK" => Ok(response.results.into_iter().next().map(|result| Coordinate {
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        })),
        "ZERO_RESULTS" => Ok(None),
        status => Err(AppError::ExternalServiceError(format!(
            "Geocoding failed with {}: {}",
            status,
            response.error_message.unwrap_or_default()
        ))),
    }
}

/// Google Geocoding API over HTTP
pub struct GoogleGeocoder {
    client: Client,
    api_key: String,
    api_url: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: &str, api_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(GoogleGeocoder {
            client,
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> AppResult<Option<Coordinate>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Geocoding returned {}",
                response.status()
            )));
        }

        first_coordinate(response.json().await?)
    }
}
