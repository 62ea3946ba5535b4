use serde::Deserialize;

use crate::error::AppResult;

/// Runtime configuration, read from `MEMORY_LANE_*` environment variables
/// (a `.env` file is honoured) on top of built-in defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,

    /// Root directory of the local object storage
    pub storage_dir: String,
    /// URL prefix under which stored objects are served
    pub storage_public_url: String,
    pub default_profile_picture_url: String,

    pub image_max_width: u32,
    pub image_max_height: u32,
    pub image_quality: u8,

    /// Google Maps Platform key, enables place autocomplete and geocoding
    pub google_api_key: Option<String>,
    pub places_api_url: String,
    pub geocoding_api_url: String,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("database_url", "sqlite://memory_lane.db")?
            .set_default("database_max_connections", 5)?
            .set_default("storage_dir", "data/storage")?
            .set_default("storage_public_url", "file://data/storage")?
            .set_default(
                "default_profile_picture_url",
                "file://data/storage/profile_pictures/placeholder-user.jpg",
            )?
            .set_default("image_max_width", 400)?
            .set_default("image_max_height", 400)?
            .set_default("image_quality", 30)?
            .set_default(
                "places_api_url",
                "https://maps.googleapis.com/maps/api/place/autocomplete/json",
            )?
            .set_default(
                "geocoding_api_url",
                "https://maps.googleapis.com/maps/api/geocode/json",
            )?
            .set_default("http_timeout_secs", 10)?
            .add_source(config::Environment::with_prefix("MEMORY_LANE").try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn places_enabled(&self) -> bool {
        self.google_api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false)
    }
}
