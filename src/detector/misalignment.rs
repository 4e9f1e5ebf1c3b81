use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::math::{Point3, Vector3};

/// Per-axis alignment precision of a detector.
///
/// Each component is the standard deviation of a zero-mean Gaussian
/// perturbation applied once when the detector is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Misalignment {
    position: Vector3,
    orientation: Vector3,
}

impl Misalignment {
    /// Creates a misalignment from position and orientation precisions.
    ///
    /// # Errors
    ///
    /// Returns the offending precision if a component is negative or not finite.
    pub fn new(position: Vector3, orientation: Vector3) -> Result<Self, Vector3> {
        for precision in [position, orientation] {
            if !precision.iter().all(|sigma| sigma.is_finite() && *sigma >= 0.0) {
                return Err(precision);
            }
        }
        Ok(Self {
            position,
            orientation,
        })
    }

    /// Reads `alignment_precision_position` and `alignment_precision_orientation`.
    pub(crate) fn from_config(section: &Configuration) -> Result<Self, ConfigError> {
        let position = section.get_or("alignment_precision_position", Vector3::zeros())?;
        let orientation = section.get_or("alignment_precision_orientation", Vector3::zeros())?;
        Self::new(position, orientation).map_err(|precision| {
            let key = if precision == position {
                "alignment_precision_position"
            } else {
                "alignment_precision_orientation"
            };
            section.invalid_value(key, "precision should be a finite non-negative number")
        })
    }

    /// Returns the per-axis position precision.
    #[must_use]
    pub fn position_precision(&self) -> Vector3 {
        self.position
    }

    /// Returns the per-axis angle precision.
    #[must_use]
    pub fn orientation_precision(&self) -> Vector3 {
        self.orientation
    }

    /// Adds a random offset to a configured position.
    pub fn perturb_position<R: Rng + ?Sized>(&self, position: &Point3, rng: &mut R) -> Point3 {
        position + sample(&self.position, rng)
    }

    /// Adds a random offset to each configured angle.
    pub fn perturb_angles<R: Rng + ?Sized>(&self, angles: &Vector3, rng: &mut R) -> Vector3 {
        angles + sample(&self.orientation, rng)
    }
}

fn sample<R: Rng + ?Sized>(sigma: &Vector3, rng: &mut R) -> Vector3 {
    sigma.map(|std_dev| Normal::new(0.0, std_dev).map_or(0.0, |normal| normal.sample(rng)))
}
