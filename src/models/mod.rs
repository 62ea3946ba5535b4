pub mod category;
pub mod memory;
pub mod place;
pub mod user;

pub use category::Category;
pub use memory::{Memory, MemoryDraft, MemoryUpdate, MEMORIES_COLLECTION};
pub use place::{Coordinate, MapMarker, PlacePrediction};
pub use user::{RegisterRequest, UpdateProfileRequest, User, USERS_COLLECTION};
