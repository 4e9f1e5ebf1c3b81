mod misalignment;

use std::sync::{Arc, OnceLock};

use nalgebra::{Translation3, UnitQuaternion};

pub use misalignment::Misalignment;

use crate::math::{Isometry3, Point3, Rotation3, Vector3};
use crate::model::DetectorModel;

/// One physical instance of a [`DetectorModel`] placed in the world.
///
/// Detectors only exist in a closed [`Geometry`](crate::Geometry), so the
/// model is always resolved. The local frame is the model frame: the model
/// center maps onto [`position`](Self::position).
#[derive(Debug)]
pub struct Detector {
    name: String,
    position: Point3,
    orientation: Rotation3,
    model: Arc<DetectorModel>,
    to_global: Isometry3,
    magnetic_field: OnceLock<Vector3>,
}

impl Detector {
    pub(crate) fn new(
        name: String,
        position: Point3,
        orientation: Rotation3,
        model: Arc<DetectorModel>,
    ) -> Self {
        let placement = Isometry3::from_parts(
            Translation3::from(position.coords),
            UnitQuaternion::from_rotation_matrix(&orientation),
        );
        let to_global = placement * Translation3::from(-model.center().coords);
        Self {
            name,
            position,
            orientation,
            model,
            to_global,
            magnetic_field: OnceLock::new(),
        }
    }

    /// Returns the unique name of the detector.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type name of the resolved model.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.model.type_name()
    }

    /// Returns the global position of the model center, misalignment included.
    #[must_use]
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// Returns the global orientation, misalignment included.
    #[must_use]
    pub fn orientation(&self) -> Rotation3 {
        self.orientation
    }

    /// Returns the resolved model, which may be a specialization of the
    /// generic model of the same type.
    #[must_use]
    pub fn model(&self) -> &Arc<DetectorModel> {
        &self.model
    }

    /// Converts a point from the local model frame to the global frame.
    #[must_use]
    pub fn global_position(&self, local: &Point3) -> Point3 {
        self.to_global.transform_point(local)
    }

    /// Converts a point from the global frame to the local model frame.
    #[must_use]
    pub fn local_position(&self, global: &Point3) -> Point3 {
        self.to_global.inverse_transform_point(global)
    }

    /// Returns whether a magnetic field has been sampled for this detector.
    #[must_use]
    pub fn has_magnetic_field(&self) -> bool {
        self.magnetic_field.get().is_some()
    }

    /// Returns the magnetic field at the detector position, zero if none is set.
    ///
    /// The field is constant over the whole sensor.
    #[must_use]
    pub fn magnetic_field(&self) -> Vector3 {
        self.magnetic_field.get().copied().unwrap_or_else(Vector3::zeros)
    }

    /// Stores the sampled field, returning `false` if one was already stored.
    pub(crate) fn set_magnetic_field(&self, field: Vector3) -> bool {
        self.magnetic_field.set(field).is_ok()
    }
}
