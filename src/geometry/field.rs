use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::math::{Point3, Vector3};

/// Signature of a magnetic field: global position to field vector.
pub type MagneticFieldFunction = Arc<dyn Fn(&Point3) -> Vector3 + Send + Sync>;

/// Shape of the magnetic field over the world volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagneticFieldType {
    /// No field is defined.
    #[default]
    None,
    /// The same field everywhere.
    Constant,
}

/// A magnetic field definition: the field function and its shape.
#[derive(Clone)]
pub struct MagneticField {
    kind: MagneticFieldType,
    function: MagneticFieldFunction,
}

impl MagneticField {
    /// Creates a field with an arbitrary function.
    #[must_use]
    pub fn new(kind: MagneticFieldType, function: MagneticFieldFunction) -> Self {
        Self { kind, function }
    }

    /// Creates a homogeneous field.
    #[must_use]
    pub fn constant(field: Vector3) -> Self {
        Self::new(MagneticFieldType::Constant, Arc::new(move |_: &Point3| field))
    }

    /// Builds a field from a field section.
    ///
    /// The `model` key selects the field shape; only `constant` is known,
    /// with the vector taken from `magnetic_field` (default zero).
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is missing or unknown, or the field vector
    /// cannot be converted.
    pub fn from_config(section: &Configuration) -> Result<Self, ConfigError> {
        let model: String = section.get("model")?;
        if model != "constant" {
            return Err(section.invalid_value("model", "model can currently only be 'constant'"));
        }
        let field = section.get_or("magnetic_field", Vector3::zeros())?;
        trace!(?field, "Adding constant magnetic field");
        Ok(Self::constant(field))
    }

    /// Returns the field shape.
    #[must_use]
    pub fn kind(&self) -> MagneticFieldType {
        self.kind
    }

    /// Evaluates the field at a global position.
    #[must_use]
    pub fn at(&self, position: &Point3) -> Vector3 {
        (self.function)(position)
    }
}

impl fmt::Debug for MagneticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagneticField").field("kind", &self.kind).finish_non_exhaustive()
    }
}
