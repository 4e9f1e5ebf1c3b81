pub mod config;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod math;
pub mod model;

pub use detector::Detector;
pub use error::{ConfigError, Error, GeometryError, Result};
pub use geometry::{Geometry, GeometryManager, MagneticField, MagneticFieldType};
pub use model::DetectorModel;
