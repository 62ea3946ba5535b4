use serde::{Deserialize, Serialize};

/// One autocomplete suggestion, split the way place pickers display it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacePrediction {
    pub place_id: Option<String>,
    pub primary_text: String,
    pub secondary_text: Option<String>,
}

impl PlacePrediction {
    /// Location string stored on a memory when this suggestion is picked
    pub fn full_text(&self) -> String {
        match self.secondary_text.as_deref() {
            Some(secondary) if !secondary.is_empty() => {
                format!("{}, {}", self.primary_text, secondary)
            }
            _ => self.primary_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub coordinate: Coordinate,
    pub title: String,
    pub snippet: String,
    pub zoom: f32,
}
