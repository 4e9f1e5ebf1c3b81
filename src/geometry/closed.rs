use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing::info;

use super::field::{MagneticField, MagneticFieldType};
use super::registry::ModelRegistry;
use crate::detector::Detector;
use crate::error::GeometryError;
use crate::math::{Aabb, Point3, Vector3};
use crate::model::DetectorModel;

/// The resolved, immutable geometry produced by closing a
/// [`GeometryManager`](super::GeometryManager).
///
/// Every detector carries its model. The only state that can still change
/// is the magnetic field, which can be set once.
#[derive(Debug)]
pub struct Geometry {
    detectors: Vec<Arc<Detector>>,
    detector_index: HashMap<String, usize>,
    models: ModelRegistry,
    points: Vec<Point3>,
    model_paths: Vec<PathBuf>,
    magnetic_field: OnceLock<MagneticField>,
}

impl Geometry {
    pub(crate) fn new(
        detectors: Vec<Arc<Detector>>,
        models: ModelRegistry,
        points: Vec<Point3>,
        model_paths: Vec<PathBuf>,
    ) -> Self {
        let detector_index = detectors
            .iter()
            .enumerate()
            .map(|(i, detector)| (detector.name().to_owned(), i))
            .collect();
        Self {
            detectors,
            detector_index,
            models,
            points,
            model_paths,
            magnetic_field: OnceLock::new(),
        }
    }

    /// Returns all detectors in the order they were added.
    #[must_use]
    pub fn detectors(&self) -> &[Arc<Detector>] {
        &self.detectors
    }

    /// Returns whether a detector with this name exists.
    #[must_use]
    pub fn has_detector(&self, name: &str) -> bool {
        self.detector_index.contains_key(name)
    }

    /// Returns the detector with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if no detector has this name.
    pub fn detector(&self, name: &str) -> Result<&Arc<Detector>, GeometryError> {
        self.detector_index
            .get(name)
            .map(|&i| &self.detectors[i])
            .ok_or_else(|| GeometryError::InvalidDetector(name.to_owned()))
    }

    /// Returns all detectors of a model type, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns an error if no detector has this type.
    pub fn detectors_by_type(&self, type_name: &str) -> Result<Vec<Arc<Detector>>, GeometryError> {
        let detectors: Vec<_> = self
            .detectors
            .iter()
            .filter(|detector| detector.type_name() == type_name)
            .cloned()
            .collect();
        if detectors.is_empty() {
            return Err(GeometryError::InvalidModel(type_name.to_owned()));
        }
        Ok(detectors)
    }

    /// Returns the generic models in registration order.
    ///
    /// Specialized models are only reachable through their detectors.
    #[must_use]
    pub fn models(&self) -> &[Arc<DetectorModel>] {
        self.models.as_slice()
    }

    /// Returns whether a generic model of this type exists.
    #[must_use]
    pub fn has_model(&self, type_name: &str) -> bool {
        self.models.contains(type_name)
    }

    /// Returns the generic model of a type.
    ///
    /// # Errors
    ///
    /// Returns an error if no model has this type.
    pub fn model(&self, type_name: &str) -> Result<&Arc<DetectorModel>, GeometryError> {
        self.models
            .get(type_name)
            .ok_or_else(|| GeometryError::InvalidModel(type_name.to_owned()))
    }

    /// Returns the search paths the models were loaded from.
    #[must_use]
    pub fn model_paths(&self) -> &[PathBuf] {
        &self.model_paths
    }

    /// Returns the free-standing points that are part of the geometry.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Returns the smallest axis-aligned box containing the origin, the model
    /// box of every detector and every free-standing point.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::at_origin();
        for detector in &self.detectors {
            let model = detector.model();
            for corner in Aabb::corners(&model.center(), &model.size()) {
                bounds.include_point(&detector.global_position(&corner));
            }
        }
        for point in &self.points {
            bounds.include_point(point);
        }
        bounds
    }

    /// Returns the point below which no part of the geometry exists on any axis.
    #[must_use]
    pub fn minimum_coordinate(&self) -> Point3 {
        self.bounds().min
    }

    /// Returns the point above which no part of the geometry exists on any axis.
    #[must_use]
    pub fn maximum_coordinate(&self) -> Point3 {
        self.bounds().max
    }

    /// Sets the global magnetic field and samples it at every detector position.
    ///
    /// # Errors
    ///
    /// Returns an error if a field has already been set.
    pub fn set_magnetic_field(&self, field: MagneticField) -> Result<(), GeometryError> {
        self.magnetic_field
            .set(field)
            .map_err(|_| GeometryError::MagneticFieldAlreadySet)?;
        let field = self.magnetic_field.get().ok_or(GeometryError::MagneticFieldAlreadySet)?;

        for detector in &self.detectors {
            detector.set_magnetic_field(field.at(&detector.position()));
        }
        info!(kind = ?field.kind(), "Set magnetic field");
        Ok(())
    }

    /// Returns whether a magnetic field has been set.
    #[must_use]
    pub fn has_magnetic_field(&self) -> bool {
        self.magnetic_field_type() != MagneticFieldType::None
    }

    /// Returns the shape of the magnetic field.
    #[must_use]
    pub fn magnetic_field_type(&self) -> MagneticFieldType {
        self.magnetic_field
            .get()
            .map_or(MagneticFieldType::None, MagneticField::kind)
    }

    /// Evaluates the magnetic field at a global position, zero without a field.
    #[must_use]
    pub fn magnetic_field(&self, position: &Point3) -> Vector3 {
        self.magnetic_field
            .get()
            .map_or_else(Vector3::zeros, |field| field.at(position))
    }
}
