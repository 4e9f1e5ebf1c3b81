use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use slotmap::{SecondaryMap, SlotMap};
use tracing::{debug, trace};

use super::closed::Geometry;
use super::model_paths::{default_model_paths, model_files};
use super::registry::ModelRegistry;
use crate::config::Configuration;
use crate::detector::{Detector, Misalignment};
use crate::error::{GeometryError, Result};
use crate::math::{OrientationMode, Point3, Rotation3, Vector3};
use crate::model::DetectorModel;

/// Model type plus the sorted override settings of a detector.
type SpecializationKey = (String, Vec<(String, String)>);

slotmap::new_key_type! {
    /// Handle of a detector registered in an open [`GeometryManager`].
    pub struct DetectorId;
}

/// Detector section keys that describe the placement rather than the model.
const PLACEMENT_KEYS: [&str; 4] = ["type", "position", "orientation", "orientation_mode"];

/// A detector whose model has not been resolved yet.
#[derive(Debug)]
struct DetectorDraft {
    name: String,
    model_type: String,
    position: Point3,
    orientation: Rotation3,
}

/// Registry of detectors and detector models while the geometry is open.
///
/// Detectors, models, points and search paths are added first. Calling
/// [`close_geometry`](Self::close_geometry) then loads the missing models,
/// resolves every detector to its model and freezes the result into a shared
/// [`Geometry`]. After closing nothing can be added anymore.
#[derive(Debug, Default)]
pub struct GeometryManager {
    drafts: SlotMap<DetectorId, DetectorDraft>,
    order: Vec<DetectorId>,
    detector_names: HashSet<String>,
    models: ModelRegistry,
    pending: BTreeMap<String, Vec<(Configuration, DetectorId)>>,
    points: Vec<Point3>,
    model_paths: Vec<PathBuf>,
    closed: Option<Arc<Geometry>>,
}

impl GeometryManager {
    /// Creates an empty, open geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads detectors from their configuration sections and registers the
    /// standard model search paths.
    ///
    /// Each section is named after its detector. Positions and angles are
    /// misaligned with a generator seeded once from `seeder`. Model search
    /// paths are registered in priority order: `model_paths` of the global
    /// section, the built-in model directory, then the `XDG_DATA_DIRS`
    /// model directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is closed, a section is invalid, a
    /// detector name is invalid or taken, or a configured model path does not
    /// exist.
    pub fn load<R: RngCore + ?Sized>(
        &mut self,
        detector_sections: &[Configuration],
        global: &Configuration,
        seeder: &mut R,
    ) -> Result<()> {
        self.ensure_open("detector")?;
        let mut rng = StdRng::seed_from_u64(seeder.next_u64());

        debug!("Loading detectors");
        for section in detector_sections {
            debug!(detector = section.name(), "Loading detector");
            let misalignment = Misalignment::from_config(section)?;

            let position: Point3 = section.get_or("position", Point3::origin())?;
            let misaligned = misalignment.perturb_position(&position, &mut rng);
            debug!(?position, ?misaligned, "Position");

            let angles: Vector3 = section.get_or("orientation", Vector3::zeros())?;
            let misaligned_angles = misalignment.perturb_angles(&angles, &mut rng);
            debug!(?angles, misaligned = ?misaligned_angles, "Orientation");

            let mode = section
                .get_or("orientation_mode", OrientationMode::default().as_str().to_owned())?
                .parse::<OrientationMode>()
                .map_err(|reason| section.invalid_value("orientation_mode", &reason))?;
            debug!(%mode, "Interpreting Euler angles");

            self.register_detector(section.clone(), misaligned, mode.rotation(&misaligned_angles))?;
        }

        if global.has("model_paths") {
            self.model_paths.extend(global.path_array("model_paths", true)?);
            trace!("Registered model paths from configuration");
        }
        let data_dirs = std::env::var("XDG_DATA_DIRS").ok();
        for path in default_model_paths(data_dirs.as_deref()) {
            trace!(path = %path.display(), "Registered model path");
            self.model_paths.push(path);
        }
        Ok(())
    }

    /// Adds a detector of the given model type at a fixed placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is closed, or the name is `global` or
    /// already taken.
    pub fn add_detector(
        &mut self,
        name: &str,
        position: Point3,
        orientation: Rotation3,
        model_type: &str,
    ) -> Result<DetectorId> {
        self.ensure_open("detector")?;
        let mut section = Configuration::new(name);
        section.set_text("type", model_type);
        self.register_detector(section, position, orientation)
    }

    /// Adds a generic model. Models added here take precedence over model
    /// files of the same type.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is closed or the type is already known.
    pub fn add_model(&mut self, model: Arc<DetectorModel>) -> Result<()> {
        self.ensure_open("model")?;
        trace!(model = model.type_name(), "Registering new model");
        self.models.insert(model)?;
        Ok(())
    }

    /// Adds a point that must be inside the geometry bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is closed.
    pub fn add_point(&mut self, point: Point3) -> Result<()> {
        self.ensure_open("point")?;
        self.points.push(point);
        Ok(())
    }

    /// Appends a model file or directory to the search paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry is closed.
    pub fn add_model_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        self.ensure_open("model path")?;
        let path = path.into();
        trace!(path = %path.display(), "Registered model path");
        self.model_paths.push(path);
        Ok(())
    }

    /// Returns whether a detector with this name was added.
    #[must_use]
    pub fn has_detector(&self, name: &str) -> bool {
        self.detector_names.contains(name)
    }

    /// Returns whether a generic model of this type is registered.
    #[must_use]
    pub fn has_model(&self, type_name: &str) -> bool {
        self.models.contains(type_name)
    }

    /// Returns whether any detector requested a model of this type.
    #[must_use]
    pub fn needs_model(&self, type_name: &str) -> bool {
        self.pending.contains_key(type_name)
    }

    /// Returns the model search paths in priority order.
    #[must_use]
    pub fn model_paths(&self) -> &[PathBuf] {
        &self.model_paths
    }

    /// Returns whether the geometry has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_some()
    }

    /// Returns the closed geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if [`close_geometry`](Self::close_geometry) has not
    /// succeeded yet.
    pub fn geometry(&self) -> Result<Arc<Geometry>> {
        Ok(self.closed.clone().ok_or(GeometryError::GeometryOpen)?)
    }

    /// Resolves all detectors to their models and freezes the geometry.
    ///
    /// Missing models are read from the search paths; the first model file
    /// with a given name wins. A detector section with keys beyond its
    /// placement gets a specialized copy of its model with those keys
    /// overriding the model parameters. Detectors with identical overrides
    /// share one specialized model.
    ///
    /// Closing again returns the same geometry. On error the manager stays
    /// open and unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if a model file cannot be read or parsed, or if a
    /// detector requests a model type that does not exist.
    pub fn close_geometry(&mut self) -> Result<Arc<Geometry>> {
        if let Some(geometry) = &self.closed {
            return Ok(Arc::clone(geometry));
        }
        trace!("Starting geometry closing procedure");

        let models = self.load_models()?;
        let resolved = self.resolve_models(&models)?;

        let detectors = self
            .order
            .iter()
            .map(|&id| -> Result<Arc<Detector>> {
                let draft = &self.drafts[id];
                let model = resolved
                    .get(id)
                    .cloned()
                    .ok_or_else(|| GeometryError::InvalidModel(draft.model_type.clone()))?;
                Ok(Arc::new(Detector::new(
                    draft.name.clone(),
                    draft.position,
                    draft.orientation,
                    model,
                )))
            })
            .collect::<Result<Vec<_>>>()?;

        let geometry = Arc::new(Geometry::new(
            detectors,
            models.clone(),
            self.points.clone(),
            self.model_paths.clone(),
        ));
        self.models = models;
        self.closed = Some(Arc::clone(&geometry));
        trace!("Closed geometry");
        Ok(geometry)
    }

    fn ensure_open(&self, what: &'static str) -> std::result::Result<(), GeometryError> {
        if self.is_closed() {
            return Err(GeometryError::GeometryClosed(what));
        }
        Ok(())
    }

    fn register_detector(
        &mut self,
        section: Configuration,
        position: Point3,
        orientation: Rotation3,
    ) -> Result<DetectorId> {
        let name = section.name().to_owned();
        trace!(detector = %name, "Registering new detector");
        if name == "global" {
            return Err(GeometryError::DetectorInvalidName(name).into());
        }
        if self.detector_names.contains(&name) {
            return Err(GeometryError::DetectorExists(name).into());
        }
        let model_type: String = section.get("type")?;

        let id = self.drafts.insert(DetectorDraft {
            name: name.clone(),
            model_type: model_type.clone(),
            position,
            orientation,
        });
        self.order.push(id);
        self.detector_names.insert(name);
        self.pending.entry(model_type).or_default().push((section, id));
        Ok(id)
    }

    /// Registers the needed models found on the search paths on top of the
    /// models added directly.
    fn load_models(&self) -> Result<ModelRegistry> {
        trace!("Loading remaining default models");
        let mut models = self.models.clone();

        for file in model_files(&self.model_paths)? {
            if models.contains(&file.name) {
                debug!(model = %file.name, path = %file.path.display(), "Skipping overwritten model");
                continue;
            }
            if !self.needs_model(&file.name) {
                trace!(model = %file.name, path = %file.path.display(), "Skipping not required model");
                continue;
            }

            trace!(path = %file.path.display(), "Reading model");
            models.insert(Arc::new(DetectorModel::from_file(&file.path)?))?;
        }
        Ok(models)
    }

    /// Picks the model of every pending detector, specializing where the
    /// detector section overrides model parameters.
    fn resolve_models(
        &self,
        models: &ModelRegistry,
    ) -> Result<SecondaryMap<DetectorId, Arc<DetectorModel>>> {
        let mut resolved = SecondaryMap::new();
        let mut specializations: HashMap<SpecializationKey, Arc<DetectorModel>> = HashMap::new();

        for (type_name, requests) in &self.pending {
            let generic = models
                .get(type_name)
                .ok_or_else(|| GeometryError::InvalidModel(type_name.clone()))?;

            for (section, id) in requests {
                let overrides = model_overrides(section);
                if overrides.is_empty() {
                    resolved.insert(*id, Arc::clone(generic));
                    continue;
                }

                let key = (
                    type_name.clone(),
                    overrides
                        .settings()
                        .map(|(key, value)| (key.to_owned(), value.to_owned()))
                        .collect(),
                );
                let model = match specializations.entry(key) {
                    Entry::Occupied(entry) => Arc::clone(entry.get()),
                    Entry::Vacant(entry) => {
                        debug!(detector = section.name(), model = %type_name, "Specializing model");
                        let specialized = Arc::new(generic.specialize(overrides)?);
                        Arc::clone(entry.insert(specialized))
                    }
                };
                resolved.insert(*id, model);
            }
        }
        Ok(resolved)
    }
}

/// Collects the keys of a detector section that override model parameters.
fn model_overrides(section: &Configuration) -> Configuration {
    let mut overrides = Configuration::new("");
    for (key, value) in section.settings() {
        if !PLACEMENT_KEYS.contains(&key) {
            overrides.set_text(key, value);
        }
    }
    overrides
}
