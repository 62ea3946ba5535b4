use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::Geocoder;
use crate::error::AppResult;
use crate::models::{MapMarker, Memory};

pub const MARKER_ZOOM: f32 = 12.0;

/// Turns a memory's location into a marker for the map view
pub struct MapService {
    geocoder: Arc<dyn Geocoder>,
}

impl MapService {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        MapService { geocoder }
    }

    /// `None` when the location does not resolve to a place
    pub async fn marker_for(&self, memory: &Memory) -> AppResult<Option<MapMarker>> {
        let Some(coordinate) = self.geocoder.geocode(&memory.location).await? else {
            warn!("No coordinates for location {:?}", memory.location);
            return Ok(None);
        };

        debug!(
            "Memory {} located at {}, {}",
            memory.id, coordinate.latitude, coordinate.longitude
        );
        Ok(Some(MapMarker {
            coordinate,
            title: memory.title.clone(),
            snippet: memory.location.clone(),
            zoom: MARKER_ZOOM,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Coordinate};
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, address: &str) -> AppResult<Option<Coordinate>> {
            Ok((address == "Hamburg").then_some(Coordinate {
                latitude: 53.55,
                longitude: 9.99,
            }))
        }
    }

    fn memory(location: &str) -> Memory {
        Memory {
            id: "m1".to_string(),
            user_id: "u1".to_string(),
            category: Category::Family,
            title: "Harbour walk".to_string(),
            description: "Fish rolls".to_string(),
            date: Utc::now(),
            location: location.to_string(),
            is_favorite: false,
            cover_image: "https://cdn.example/c.jpg".to_string(),
            gallery_images: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_marker_for_resolved_location() {
        let maps = MapService::new(Arc::new(FixedGeocoder));
        let marker = maps.marker_for(&memory("Hamburg")).await.unwrap().unwrap();

        assert_eq!(marker.title, "Harbour walk");
        assert_eq!(marker.snippet, "Hamburg");
        assert_eq!(marker.zoom, 12.0);
        assert_eq!(marker.coordinate.latitude, 53.55);
    }

    #[tokio::test]
    async fn test_unresolved_location_has_no_marker() {
        let maps = MapService::new(Arc::new(FixedGeocoder));
        assert!(maps.marker_for(&memory("Atlantis")).await.unwrap().is_none());
    }
}
