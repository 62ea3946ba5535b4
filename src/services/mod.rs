pub mod image;
pub mod maps;
pub mod memory;
pub mod places;
pub mod session;
pub mod upload;

pub use image::{ImagePolicy, ImageProcessor};
pub use maps::MapService;
pub use memory::{ImageEdit, MemoryService};
pub use places::PlacesService;
pub use session::SessionService;
pub use upload::{UploadSequencer, UploadedImages};
