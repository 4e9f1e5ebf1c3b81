mod closed;
pub mod field;
mod manager;
pub mod model_paths;
mod registry;

pub use closed::Geometry;
pub use field::{MagneticField, MagneticFieldFunction, MagneticFieldType};
pub use manager::{DetectorId, GeometryManager};
