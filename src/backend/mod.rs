pub mod auth;
pub mod documents;
pub mod factory;
pub mod geocoding;
pub mod places;
pub mod storage;
pub mod types;

pub use auth::SqlAuthProvider;
pub use documents::SqlDocumentStore;
pub use factory::{BackendFactory, Backends};
pub use geocoding::GoogleGeocoder;
pub use places::GooglePlacesClient;
pub use storage::{LocalObjectStorage, StorageNamespace};
pub use types::{
    AuthProvider, Document, DocumentStore, Filter, Geocoder, ObjectStorage, PlacesProvider,
    Subscription,
};
