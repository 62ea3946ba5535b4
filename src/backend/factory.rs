use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::auth::SqlAuthProvider;
use super::documents::SqlDocumentStore;
use super::geocoding::GoogleGeocoder;
use super::places::GooglePlacesClient;
use super::storage::LocalObjectStorage;
use super::types::{AuthProvider, DocumentStore, Geocoder, ObjectStorage, PlacesProvider};
use crate::config::Config;
use crate::db::Database;
use crate::error::AppResult;

/// The set of external collaborators the app talks to
#[derive(Clone)]
pub struct Backends {
    pub auth: Arc<dyn AuthProvider>,
    pub documents: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub places: Option<Arc<dyn PlacesProvider>>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
}

/// Factory for creating the backend clients
pub struct BackendFactory;

impl BackendFactory {
    /// Connects the database, runs migrations and builds every client the
    /// configuration enables
    pub async fn from_config(config: &Config) -> AppResult<Backends> {
        let db = Database::new(&config.database_url, config.database_max_connections).await?;
        info!("Database connected");

        db.run_migrations().await?;
        info!("Database migrations completed");

        Self::create(config, db)
    }

    pub fn create(config: &Config, db: Database) -> AppResult<Backends> {
        let storage = LocalObjectStorage::new(&config.storage_dir, &config.storage_public_url);
        info!("Object storage rooted at {}", config.storage_dir);

        let (places, geocoder) = match config.google_api_key.as_deref() {
            Some(api_key) if config.places_enabled() => {
                let timeout = Duration::from_secs(config.http_timeout_secs);
                let places: Arc<dyn PlacesProvider> = Arc::new(GooglePlacesClient::new(
                    api_key,
                    &config.places_api_url,
                    timeout,
                )?);
                let geocoder: Arc<dyn Geocoder> = Arc::new(GoogleGeocoder::new(
                    api_key,
                    &config.geocoding_api_url,
                    timeout,
                )?);
                info!("Place autocomplete and geocoding enabled");
                (Some(places), Some(geocoder))
            }
            _ => {
                info!("No Google API key configured, place lookup disabled");
                (None, None)
            }
        };

        Ok(Backends {
            auth: Arc::new(SqlAuthProvider::new(db.clone())),
            documents: Arc::new(SqlDocumentStore::new(db)),
            storage: Arc::new(storage),
            places,
            geocoder,
        })
    }
}
