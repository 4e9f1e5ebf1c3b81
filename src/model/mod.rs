pub mod assembly;
mod support;

use std::io;
use std::path::Path;

use tracing::trace;

pub use assembly::{Assembly, Excess, HybridAssembly, ModelAssembly, MonolithicAssembly};
pub use support::{SupportLayer, SupportLocation};

use crate::config::{ConfigReader, Configuration};
use crate::error::ConfigError;
use crate::math::{Aabb, Point3, UVector2, Vector2, Vector3};

/// Geometric description of one detector type.
///
/// A model always has a pixel grid which defines the base size of the
/// sensor, the chip and the support. Every part has a center and a size
/// derived from a few primary parameters; nothing derived is stored.
///
/// All positions are local coordinates in which [`center`](Self::center) is
/// the point that maps onto the detector position in the global frame.
#[derive(Debug, Clone)]
pub struct DetectorModel {
    type_name: String,
    assembly: ModelAssembly,
    number_of_pixels: UVector2,
    pixel_size: Vector2,
    sensor_thickness: f64,
    sensor_excess: Excess,
    chip_thickness: f64,
    support_layers: Vec<SupportLayer>,
    reader: ConfigReader,
}

impl DetectorModel {
    /// Parses a model from its configuration sections.
    ///
    /// The header holds the model parameters, every `support` section adds
    /// a support layer in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a required parameter is missing, a value cannot be
    /// converted, or the model type or a support location is not recognized.
    pub fn from_reader(type_name: impl Into<String>, reader: ConfigReader) -> Result<Self, ConfigError> {
        let type_name = type_name.into();
        let header = reader.header_configuration();

        let assembly = ModelAssembly::from_config(&header)?;
        let number_of_pixels = header.get("number_of_pixels")?;
        let pixel_size = header.get("pixel_size")?;
        let sensor_thickness = header.get("sensor_thickness")?;
        let sensor_excess = Excess::from_config(&header, "sensor_excess")?;
        let chip_thickness = header.get_or("chip_thickness", 0.0)?;

        let support_layers = reader
            .configurations_named("support")
            .map(SupportLayer::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        trace!(
            model = %type_name,
            assembly = %assembly,
            supports = support_layers.len(),
            "Parsed detector model"
        );

        Ok(Self {
            type_name,
            assembly,
            number_of_pixels,
            pixel_size,
            sensor_thickness,
            sensor_excess,
            chip_thickness,
            support_layers,
            reader,
        })
    }

    /// Reads a model file; the model is named after the file stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not describe a
    /// valid model.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_reader(model_name(path)?, ConfigReader::from_file(path)?)
    }

    /// Creates a distinct model of the same type with some parameters replaced.
    ///
    /// The overrides form a header section placed before the sections of this
    /// model, so they take precedence over the values of this model.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined configuration is not a valid model.
    pub fn specialize(&self, overrides: Configuration) -> Result<Self, ConfigError> {
        let mut reader = ConfigReader::new();
        reader.add_configuration(overrides);
        for configuration in self.configurations() {
            reader.add_configuration(configuration);
        }
        Self::from_reader(self.type_name.clone(), reader)
    }

    /// Reconstructs the sections this model was parsed from.
    ///
    /// The merged header comes first, followed by every named section in
    /// declaration order.
    #[must_use]
    pub fn configurations(&self) -> Vec<Configuration> {
        std::iter::once(self.reader.header_configuration())
            .chain(
                self.reader
                    .configurations()
                    .iter()
                    .filter(|c| !c.name().is_empty())
                    .cloned(),
            )
            .collect()
    }

    /// Returns the name of the model type, e.g. `timepix`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the chip placement variant.
    #[must_use]
    pub fn assembly(&self) -> &ModelAssembly {
        &self.assembly
    }

    /// Returns the local coordinate that corresponds to the detector position.
    ///
    /// Local coordinates put the center of the first pixel at the origin, so
    /// this is the middle of the pixel grid. It is not the geometric center
    /// of the sensor when the excess is asymmetric.
    #[must_use]
    pub fn center(&self) -> Point3 {
        let grid = self.grid_size();
        Point3::new(
            grid.x / 2.0 - self.pixel_size.x / 2.0,
            grid.y / 2.0 - self.pixel_size.y / 2.0,
            0.0,
        )
    }

    /// Returns the size of the smallest box centered at [`center`](Self::center)
    /// that contains the sensor, the chip and all support layers.
    ///
    /// This is the minimal box around the parts only if the center happens to
    /// be their geometric center.
    #[must_use]
    pub fn size(&self) -> Vector3 {
        let mut aabb = Aabb::empty();
        aabb.include_box(&self.sensor_center(), &self.sensor_size());
        aabb.include_box(&self.chip_center(), &self.chip_size());
        for layer in self.support_layers() {
            aabb.include_box(&layer.center(), &layer.size());
        }
        aabb.symmetric_size(&self.center())
    }

    /// Returns the number of pixels along x and y.
    #[must_use]
    pub fn number_of_pixels(&self) -> UVector2 {
        self.number_of_pixels
    }

    /// Returns the size of a single pixel.
    #[must_use]
    pub fn pixel_size(&self) -> Vector2 {
        self.pixel_size
    }

    /// Returns the total size of the pixel grid; the grid has no thickness.
    #[must_use]
    pub fn grid_size(&self) -> Vector3 {
        Vector3::new(
            f64::from(self.number_of_pixels.x) * self.pixel_size.x,
            f64::from(self.number_of_pixels.y) * self.pixel_size.y,
            0.0,
        )
    }

    /// Returns the sensor thickness.
    #[must_use]
    pub fn sensor_thickness(&self) -> f64 {
        self.sensor_thickness
    }

    /// Returns the sensor excess around the pixel grid.
    #[must_use]
    pub fn sensor_excess(&self) -> Excess {
        self.sensor_excess
    }

    /// Returns the size of the sensor: the grid plus excess, and its thickness.
    #[must_use]
    pub fn sensor_size(&self) -> Vector3 {
        let excess = &self.sensor_excess;
        self.grid_size() + Vector3::new(excess.width(), excess.height(), self.sensor_thickness)
    }

    /// Returns the center of the sensor, shifted by asymmetric excess.
    #[must_use]
    pub fn sensor_center(&self) -> Point3 {
        let offset = self.sensor_excess.center_offset();
        self.center() + Vector3::new(offset.x, offset.y, 0.0)
    }

    /// Returns the effective chip thickness.
    #[must_use]
    pub fn chip_thickness(&self) -> f64 {
        self.assembly.chip_thickness(self.chip_thickness)
    }

    /// Returns the size of the chip.
    #[must_use]
    pub fn chip_size(&self) -> Vector3 {
        let excess = self.assembly.chip_excess(&self.sensor_excess);
        self.grid_size() + Vector3::new(excess.width(), excess.height(), self.chip_thickness())
    }

    /// Returns the center of the chip, on top of the sensor back face.
    #[must_use]
    pub fn chip_center(&self) -> Point3 {
        let offset = self.assembly.chip_excess(&self.sensor_excess).center_offset();
        let z = self.sensor_size().z / 2.0 + self.assembly.chip_gap() + self.chip_size().z / 2.0;
        self.center() + Vector3::new(offset.x, offset.y, z)
    }

    /// Returns the center of the bump-bond layer of hybrid models.
    #[must_use]
    pub fn bumps_center(&self) -> Option<Point3> {
        let ModelAssembly::Hybrid(hybrid) = &self.assembly else {
            return None;
        };
        let offset = hybrid.bump_offset();
        let z = self.sensor_size().z / 2.0 + hybrid.bump_height() / 2.0;
        Some(self.center() + Vector3::new(offset.x, offset.y, z))
    }

    /// Returns the size of the bump-bond layer of hybrid models.
    #[must_use]
    pub fn bumps_size(&self) -> Option<Vector3> {
        let ModelAssembly::Hybrid(hybrid) = &self.assembly else {
            return None;
        };
        let grid = self.grid_size();
        Some(Vector3::new(grid.x, grid.y, hybrid.bump_height()))
    }

    /// Returns all support layers with their centers resolved.
    ///
    /// Sensor-side and chip-side layers are stacked outward in declaration
    /// order, each starting at the respective outer face; absolute layers
    /// keep their configured offset.
    #[must_use]
    pub fn support_layers(&self) -> Vec<SupportLayer> {
        let center = self.center();
        let mut sensor_offset = -self.sensor_size().z / 2.0;
        let mut chip_offset =
            self.sensor_size().z / 2.0 + self.assembly.chip_gap() + self.chip_size().z;

        self.support_layers
            .iter()
            .map(|layer| {
                let thickness = layer.size().z;
                let mut offset = layer.offset();
                match layer.location() {
                    SupportLocation::Sensor => {
                        offset.z = sensor_offset - thickness / 2.0;
                        sensor_offset -= thickness;
                    }
                    SupportLocation::Chip => {
                        offset.z = chip_offset + thickness / 2.0;
                        chip_offset += thickness;
                    }
                    SupportLocation::Absolute => {}
                }
                layer.clone().placed_at(center + offset)
            })
            .collect()
    }
}

/// Returns the model type named by a model file, its file stem.
pub(crate) fn model_name(path: &Path) -> Result<String, ConfigError> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| ConfigError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "model file has no file name"),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn model(text: &str) -> DetectorModel {
        DetectorModel::from_reader("test", ConfigReader::parse(text, None).unwrap()).unwrap()
    }

    const BASIC: &str = "
type = hybrid
number_of_pixels = 2 2
pixel_size = 100um 100um
sensor_thickness = 300um
";

    #[test]
    fn basic_grid_and_center() {
        let m = model(BASIC);
        assert_relative_eq!(m.grid_size(), Vector3::new(0.2, 0.2, 0.0), epsilon = 1e-12);
        assert_relative_eq!(m.sensor_size(), Vector3::new(0.2, 0.2, 0.3), epsilon = 1e-12);
        assert_relative_eq!(m.center(), Point3::new(0.05, 0.05, 0.0), epsilon = 1e-12);
        assert_eq!(m.number_of_pixels(), UVector2::new(2, 2));
        assert_eq!(m.type_name(), "test");
    }

    #[test]
    fn grid_size_is_count_times_pitch() {
        let m = model(
            "type = monolithic\nnumber_of_pixels = 1152 576\npixel_size = 18.4um 18.4um\nsensor_thickness = 50um\n",
        );
        assert_relative_eq!(m.grid_size().x, 1152.0 * 0.0184, epsilon = 1e-9);
        assert_relative_eq!(m.grid_size().y, 576.0 * 0.0184, epsilon = 1e-9);
        assert_relative_eq!(m.grid_size().z, 0.0);
    }

    #[test]
    fn symmetric_excess_keeps_sensor_centered() {
        let m = model(&format!("{BASIC}sensor_excess = 1mm\n"));
        assert_relative_eq!(m.sensor_center().x, m.center().x, epsilon = 1e-12);
        assert_relative_eq!(m.sensor_center().y, m.center().y, epsilon = 1e-12);
        assert_relative_eq!(m.sensor_size().x, 2.2, epsilon = 1e-12);
    }

    #[test]
    fn asymmetric_excess_shifts_sensor() {
        let m = model(&format!("{BASIC}sensor_excess_right = 1mm\nsensor_excess_bottom = 2mm\n"));
        let shift = m.sensor_center() - m.center();
        assert_relative_eq!(shift, Vector3::new(0.5, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn hybrid_chip_sits_above_bumps() {
        let m = model(&format!("{BASIC}chip_thickness = 700um\nbump_height = 20um\n"));
        assert_relative_eq!(m.chip_size(), Vector3::new(0.2, 0.2, 0.7), epsilon = 1e-12);
        assert_relative_eq!(m.chip_center().z, 0.15 + 0.02 + 0.35, epsilon = 1e-12);
        assert_relative_eq!(m.bumps_center().unwrap().z, 0.15 + 0.01, epsilon = 1e-12);
        assert_relative_eq!(m.bumps_size().unwrap(), Vector3::new(0.2, 0.2, 0.02), epsilon = 1e-12);
    }

    #[test]
    fn monolithic_chip_is_flush_with_sensor() {
        let m = model(
            "type = monolithic\nnumber_of_pixels = 2 2\npixel_size = 100um 100um\nsensor_thickness = 300um\nchip_thickness = 1mm\nsensor_excess = 50um\n",
        );
        assert_relative_eq!(m.chip_thickness(), 0.0);
        assert_relative_eq!(m.chip_center().z, 0.15, epsilon = 1e-12);
        assert_relative_eq!(m.chip_size().x, m.sensor_size().x, epsilon = 1e-12);
        assert!(m.bumps_center().is_none());
        assert_relative_eq!(m.size(), m.sensor_size(), epsilon = 1e-12);
    }

    #[test]
    fn chip_side_supports_stack_without_gaps() {
        let m = model(&format!(
            "{BASIC}chip_thickness = 700um\n\
             [support]\nthickness = 1mm\nsize = 1mm 1mm\n\
             [support]\nthickness = 2mm\nsize = 1mm 1mm\nlocation = sensor\n\
             [support]\nthickness = 500um\nsize = 1mm 1mm\nlocation = chip\n"
        ));
        let layers = m.support_layers();
        assert_eq!(layers.len(), 3);

        let chip_top = m.chip_center().z + m.chip_size().z / 2.0;
        let first = &layers[0];
        let third = &layers[2];
        assert_relative_eq!(first.center().z - first.size().z / 2.0, chip_top, epsilon = 1e-12);
        assert_relative_eq!(
            third.center().z - third.size().z / 2.0,
            first.center().z + first.size().z / 2.0,
            epsilon = 1e-12
        );

        let sensor_bottom = m.sensor_center().z - m.sensor_size().z / 2.0;
        let second = &layers[1];
        assert_relative_eq!(second.center().z + second.size().z / 2.0, sensor_bottom, epsilon = 1e-12);
    }

    #[test]
    fn hybrid_chip_supports_start_above_the_bumps() {
        let m = model(&format!(
            "{BASIC}chip_thickness = 700um\nbump_height = 20um\n\
             [support]\nthickness = 1mm\nsize = 1mm 1mm\n\
             [support]\nthickness = 500um\nsize = 1mm 1mm\nlocation = sensor\n\
             [support]\nthickness = 1mm\nsize = 1mm 1mm\nlocation = SENSOR\n"
        ));
        let layers = m.support_layers();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[2].location(), SupportLocation::Sensor);

        let chip_top = m.chip_center().z + m.chip_size().z / 2.0;
        assert_relative_eq!(chip_top, 0.87, epsilon = 1e-12);
        assert_relative_eq!(layers[0].center().z - layers[0].size().z / 2.0, chip_top, epsilon = 1e-12);

        assert_relative_eq!(layers[1].center().z, -0.4, epsilon = 1e-12);
        assert_relative_eq!(
            layers[2].center().z + layers[2].size().z / 2.0,
            layers[1].center().z - layers[1].size().z / 2.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(layers[2].center().z, -1.15, epsilon = 1e-12);

        // The chip-side stack reaches further than the sensor-side one
        assert_relative_eq!(m.size().z, 2.0 * 1.87, epsilon = 1e-12);
    }

    #[test]
    fn model_file_without_a_stem_is_rejected() {
        assert!(matches!(
            DetectorModel::from_file(Path::new("/")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn absolute_support_uses_offset_from_center() {
        let m = model(&format!(
            "{BASIC}[support]\nthickness = 1mm\nsize = 1mm 1mm\nlocation = absolute\noffset = 1mm 2mm -3mm\n"
        ));
        let layer = &m.support_layers()[0];
        assert_relative_eq!(layer.center(), m.center() + Vector3::new(1.0, 2.0, -3.0), epsilon = 1e-12);
    }

    #[test]
    fn size_is_symmetric_about_center() {
        let m = model(&format!(
            "{BASIC}chip_thickness = 700um\nsensor_excess_left = 1mm\n\
             [support]\nthickness = 1mm\nsize = 5mm 3mm\noffset = 2mm 0mm\n\
             [support]\nthickness = 200um\nsize = 1mm 1mm\nlocation = sensor\n"
        ));
        let center = m.center();
        let half = m.size() / 2.0;
        let mut parts = vec![(m.sensor_center(), m.sensor_size()), (m.chip_center(), m.chip_size())];
        parts.extend(m.support_layers().iter().map(|l| (l.center(), l.size())));
        for (part_center, part_size) in parts {
            for axis in 0..3 {
                let lo = part_center[axis] - part_size[axis] / 2.0;
                let hi = part_center[axis] + part_size[axis] / 2.0;
                assert!(lo >= center[axis] - half[axis] - 1e-12);
                assert!(hi <= center[axis] + half[axis] + 1e-12);
            }
        }
        // The envelope is tight on at least one side of every axis
        let x_extent = m.support_layers()[0].center().x + 2.5;
        assert_relative_eq!(center.x + half.x, x_extent, epsilon = 1e-12);
    }

    #[test]
    fn missing_required_parameter_fails() {
        let result = DetectorModel::from_reader(
            "broken",
            ConfigReader::parse("type = hybrid\npixel_size = 1mm 1mm\nsensor_thickness = 1mm\n", None).unwrap(),
        );
        assert!(matches!(
            result,
            Err(ConfigError::MissingKey { ref key, .. }) if key == "number_of_pixels"
        ));
    }

    #[test]
    fn configurations_put_merged_header_first() {
        let mut reader = ConfigReader::parse(
            &format!("{BASIC}[support]\nthickness = 1mm\nsize = 1mm 1mm\n"),
            None,
        )
        .unwrap();
        let mut extra = Configuration::new("");
        extra.set_text("chip_thickness", "1mm");
        reader.add_configuration(extra);

        let m = DetectorModel::from_reader("test", reader).unwrap();
        let configs = m.configurations();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].name(), "");
        assert!(configs[0].has("chip_thickness"));
        assert!(configs[0].has("sensor_thickness"));
        assert_eq!(configs[1].name(), "support");
    }

    #[test]
    fn specialization_overrides_and_keeps_the_rest() {
        let m = model(&format!("{BASIC}[support]\nthickness = 1mm\nsize = 1mm 1mm\n"));
        let mut overrides = Configuration::new("");
        overrides.set_text("sensor_thickness", "500um");

        let special = m.specialize(overrides).unwrap();
        assert_relative_eq!(special.sensor_thickness(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(m.sensor_thickness(), 0.3, epsilon = 1e-12);
        assert_eq!(special.number_of_pixels(), m.number_of_pixels());
        assert_eq!(special.support_layers().len(), 1);
        assert_eq!(special.type_name(), m.type_name());
    }
}
