use std::fmt;
use std::str::FromStr;

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::math::{Point3, Vector2, Vector3, TOLERANCE};

/// Where a support layer is attached to its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportLocation {
    /// Stacked below the sensor, away from the chip.
    Sensor,
    /// Stacked above the chip.
    Chip,
    /// Placed at a fixed offset from the model center.
    Absolute,
}

impl FromStr for SupportLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sensor" => Ok(Self::Sensor),
            "chip" => Ok(Self::Chip),
            "absolute" => Ok(Self::Absolute),
            _ => Err("location of the support should be 'chip', 'sensor' or 'absolute'".to_owned()),
        }
    }
}

impl fmt::Display for SupportLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sensor => "sensor",
            Self::Chip => "chip",
            Self::Absolute => "absolute",
        })
    }
}

/// A planar slab of material attached to a detector model.
///
/// The center is only meaningful on layers returned by
/// [`DetectorModel::support_layers`](super::DetectorModel::support_layers),
/// which stacks them according to their location.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportLayer {
    center: Point3,
    size: Vector3,
    material: String,
    hole_size: Vector3,
    offset: Vector3,
    hole_offset: Vector2,
    location: SupportLocation,
}

impl SupportLayer {
    pub(crate) fn new(
        size: &Vector2,
        thickness: f64,
        offset: Vector3,
        material: String,
        location: SupportLocation,
        hole_size: &Vector2,
        hole_offset: Vector2,
    ) -> Self {
        Self {
            center: Point3::origin(),
            size: Vector3::new(size.x, size.y, thickness),
            material,
            hole_size: Vector3::new(hole_size.x, hole_size.y, thickness),
            offset,
            hole_offset,
            location,
        }
    }

    /// Reads a layer from a `support` section of a model file.
    pub(crate) fn from_config(config: &Configuration) -> Result<Self, ConfigError> {
        let thickness: f64 = config.get("thickness")?;
        let size: Vector2 = config.get("size")?;

        let location = config
            .get_or("location", "chip".to_owned())?
            .parse::<SupportLocation>()
            .map_err(|reason| config.invalid_value("location", &reason))?;

        let offset = if location == SupportLocation::Absolute {
            config.get::<Vector3>("offset")?
        } else {
            let xy: Vector2 = config.get_or("offset", Vector2::zeros())?;
            Vector3::new(xy.x, xy.y, 0.0)
        };

        let material = config.get_or("material", "g10".to_owned())?.to_lowercase();
        let hole_size: Vector2 = config.get_or("hole_size", Vector2::zeros())?;
        let hole_offset: Vector2 = config.get_or("hole_offset", Vector2::zeros())?;

        Ok(Self::new(
            &size,
            thickness,
            offset,
            material,
            location,
            &hole_size,
            hole_offset,
        ))
    }

    pub(crate) fn placed_at(mut self, center: Point3) -> Self {
        self.center = center;
        self
    }

    /// Returns the center of the layer in local coordinates.
    #[must_use]
    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Returns the full size of the layer, thickness along z.
    #[must_use]
    pub fn size(&self) -> Vector3 {
        self.size
    }

    /// Returns the lower-cased material name.
    #[must_use]
    pub fn material(&self) -> &str {
        &self.material
    }

    /// Returns where the layer is attached.
    #[must_use]
    pub fn location(&self) -> SupportLocation {
        self.location
    }

    /// Returns the configured offset from the model center.
    #[must_use]
    pub fn offset(&self) -> Vector3 {
        self.offset
    }

    /// Returns whether the layer has a hole.
    #[must_use]
    pub fn has_hole(&self) -> bool {
        self.hole_size.x > TOLERANCE && self.hole_size.y > TOLERANCE
    }

    /// Returns the center of the hole.
    #[must_use]
    pub fn hole_center(&self) -> Point3 {
        self.center + Vector3::new(self.hole_offset.x, self.hole_offset.y, 0.0)
    }

    /// Returns the full size of the hole, which spans the layer thickness.
    #[must_use]
    pub fn hole_size(&self) -> Vector3 {
        self.hole_size
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn section(settings: &[(&str, &str)]) -> Configuration {
        let mut config = Configuration::new("support");
        for (key, value) in settings {
            config.set_text(*key, *value);
        }
        config
    }

    #[test]
    fn defaults_to_chip_side_g10() {
        let layer = SupportLayer::from_config(&section(&[
            ("thickness", "1.5mm"),
            ("size", "10mm 20mm"),
        ]))
        .unwrap();
        assert_eq!(layer.location(), SupportLocation::Chip);
        assert_eq!(layer.material(), "g10");
        assert_relative_eq!(layer.size(), Vector3::new(10.0, 20.0, 1.5));
        assert_relative_eq!(layer.offset(), Vector3::zeros());
        assert!(!layer.has_hole());
    }

    #[test]
    fn location_and_material_ignore_case() {
        let layer = SupportLayer::from_config(&section(&[
            ("thickness", "1mm"),
            ("size", "1mm 1mm"),
            ("location", "\"Sensor\""),
            ("material", "Kapton"),
        ]))
        .unwrap();
        assert_eq!(layer.location(), SupportLocation::Sensor);
        assert_eq!(layer.material(), "kapton");
    }

    #[test]
    fn unknown_location_is_invalid() {
        let result = SupportLayer::from_config(&section(&[
            ("thickness", "1mm"),
            ("size", "1mm 1mm"),
            ("location", "beside"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "location"
        ));
    }

    #[test]
    fn absolute_layers_need_a_3d_offset() {
        let base = [("thickness", "1mm"), ("size", "1mm 1mm"), ("location", "absolute")];
        assert!(SupportLayer::from_config(&section(&base)).is_err());

        let mut settings = base.to_vec();
        settings.push(("offset", "1mm 2mm 3mm"));
        let layer = SupportLayer::from_config(&section(&settings)).unwrap();
        assert_relative_eq!(layer.offset(), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn hole_needs_both_dimensions() {
        let thin = SupportLayer::new(
            &Vector2::new(5.0, 5.0),
            1.0,
            Vector3::zeros(),
            "g10".to_owned(),
            SupportLocation::Chip,
            &Vector2::new(2.0, 1e-12),
            Vector2::zeros(),
        );
        assert!(!thin.has_hole());

        let holed = SupportLayer::new(
            &Vector2::new(5.0, 5.0),
            1.0,
            Vector3::zeros(),
            "g10".to_owned(),
            SupportLocation::Chip,
            &Vector2::new(2.0, 1.0),
            Vector2::new(0.5, -0.5),
        )
        .placed_at(Point3::new(1.0, 1.0, 1.0));
        assert!(holed.has_hole());
        assert_relative_eq!(holed.hole_size(), Vector3::new(2.0, 1.0, 1.0));
        assert_relative_eq!(holed.hole_center(), Point3::new(1.5, 0.5, 1.0));
    }
}
