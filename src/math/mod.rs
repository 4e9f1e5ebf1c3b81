pub mod aabb;
pub mod orientation;

pub use aabb::Aabb;
pub use orientation::OrientationMode;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Unsigned 2D vector, used for pixel counts.
pub type UVector2 = nalgebra::Vector2<u32>;

/// 3D rotation matrix.
pub type Rotation3 = nalgebra::Rotation3<f64>;

/// Rigid transformation between two frames.
pub type Isometry3 = nalgebra::Isometry3<f64>;

/// Dimensions at or below this value are treated as absent.
pub const TOLERANCE: f64 = 1e-9;
