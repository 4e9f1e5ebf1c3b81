use std::fmt;

use tracing::warn;

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::math::{Vector2, TOLERANCE};

/// Extra material beyond the pixel grid, per edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Excess {
    /// Excess at positive y.
    pub top: f64,
    /// Excess at positive x.
    pub right: f64,
    /// Excess at negative y.
    pub bottom: f64,
    /// Excess at negative x.
    pub left: f64,
}

impl Excess {
    /// Reads `<prefix>` as a default for `<prefix>_{top,right,bottom,left}`.
    pub(crate) fn from_config(config: &Configuration, prefix: &str) -> Result<Self, ConfigError> {
        let default: f64 = config.get_or(prefix, 0.0)?;
        let edge = |name: &str| config.get_or(&format!("{prefix}_{name}"), default);
        Ok(Self {
            top: edge("top")?,
            right: edge("right")?,
            bottom: edge("bottom")?,
            left: edge("left")?,
        })
    }

    /// Total excess along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right + self.left
    }

    /// Total excess along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.top + self.bottom
    }

    /// Shift of the covered area's center caused by asymmetric excess.
    #[must_use]
    pub fn center_offset(&self) -> Vector2 {
        Vector2::new((self.right - self.left) / 2.0, (self.top - self.bottom) / 2.0)
    }
}

/// Variant-specific chip placement.
pub trait Assembly {
    /// Excess of the chip beyond the pixel grid.
    fn chip_excess(&self, sensor_excess: &Excess) -> Excess;

    /// Effective chip thickness given the configured one.
    fn chip_thickness(&self, configured: f64) -> f64;

    /// Distance between the sensor back face and the chip.
    fn chip_gap(&self) -> f64;
}

/// Sensor bump-bonded to a separate readout chip.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridAssembly {
    chip_excess: Excess,
    bump_height: f64,
    bump_sphere_radius: f64,
    bump_cylinder_radius: f64,
    bump_offset: Vector2,
}

impl HybridAssembly {
    pub(crate) fn from_config(header: &Configuration) -> Result<Self, ConfigError> {
        Ok(Self {
            chip_excess: Excess::from_config(header, "chip_excess")?,
            bump_height: header.get_or("bump_height", 0.0)?,
            bump_sphere_radius: header.get_or("bump_sphere_radius", 0.0)?,
            bump_cylinder_radius: header.get_or("bump_cylinder_radius", 0.0)?,
            bump_offset: header.get_or("bump_offset", Vector2::zeros())?,
        })
    }

    /// Height of the bump-bond layer.
    #[must_use]
    pub fn bump_height(&self) -> f64 {
        self.bump_height
    }

    /// Radius of the solder sphere of a bump.
    #[must_use]
    pub fn bump_sphere_radius(&self) -> f64 {
        self.bump_sphere_radius
    }

    /// Radius of the cylinder connecting a bump to the chip.
    #[must_use]
    pub fn bump_cylinder_radius(&self) -> f64 {
        self.bump_cylinder_radius
    }

    /// In-plane offset of the bump grid.
    #[must_use]
    pub fn bump_offset(&self) -> Vector2 {
        self.bump_offset
    }
}

impl Assembly for HybridAssembly {
    fn chip_excess(&self, _sensor_excess: &Excess) -> Excess {
        self.chip_excess
    }

    fn chip_thickness(&self, configured: f64) -> f64 {
        configured
    }

    fn chip_gap(&self) -> f64 {
        self.bump_height
    }
}

/// Sensor and readout electronics in one silicon volume.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonolithicAssembly;

impl Assembly for MonolithicAssembly {
    fn chip_excess(&self, sensor_excess: &Excess) -> Excess {
        *sensor_excess
    }

    fn chip_thickness(&self, _configured: f64) -> f64 {
        0.0
    }

    fn chip_gap(&self) -> f64 {
        0.0
    }
}

/// The assembly of a model, selected by its `type` key.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelAssembly {
    Hybrid(HybridAssembly),
    Monolithic(MonolithicAssembly),
}

impl ModelAssembly {
    /// Selects and reads the assembly from a model header.
    pub(crate) fn from_config(header: &Configuration) -> Result<Self, ConfigError> {
        let kind: String = header.get("type")?;
        match kind.as_str() {
            "hybrid" => Ok(Self::Hybrid(HybridAssembly::from_config(header)?)),
            "monolithic" => {
                let chip_thickness: f64 = header.get_or("chip_thickness", 0.0)?;
                if chip_thickness.abs() > TOLERANCE {
                    warn!("Ignoring chip_thickness of monolithic model, chip is part of the sensor");
                }
                Ok(Self::Monolithic(MonolithicAssembly))
            }
            _ => Err(header.invalid_value("type", "model type is not supported")),
        }
    }

    /// Returns the `type` keyword of the assembly.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hybrid(_) => "hybrid",
            Self::Monolithic(_) => "monolithic",
        }
    }

    fn inner(&self) -> &dyn Assembly {
        match self {
            Self::Hybrid(hybrid) => hybrid,
            Self::Monolithic(monolithic) => monolithic,
        }
    }
}

impl Assembly for ModelAssembly {
    fn chip_excess(&self, sensor_excess: &Excess) -> Excess {
        self.inner().chip_excess(sensor_excess)
    }

    fn chip_thickness(&self, configured: f64) -> f64 {
        self.inner().chip_thickness(configured)
    }

    fn chip_gap(&self) -> f64 {
        self.inner().chip_gap()
    }
}

impl fmt::Display for ModelAssembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
