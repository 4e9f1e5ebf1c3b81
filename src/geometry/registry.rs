use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GeometryError;
use crate::model::DetectorModel;

/// Generic models in registration order, indexed by type name.
#[derive(Debug, Clone, Default)]
pub(crate) struct ModelRegistry {
    models: Vec<Arc<DetectorModel>>,
    index: HashMap<String, usize>,
}

impl ModelRegistry {
    pub(crate) fn insert(&mut self, model: Arc<DetectorModel>) -> Result<(), GeometryError> {
        let name = model.type_name();
        if self.index.contains_key(name) {
            return Err(GeometryError::DetectorModelExists(name.to_owned()));
        }
        self.index.insert(name.to_owned(), self.models.len());
        self.models.push(model);
        Ok(())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<DetectorModel>> {
        self.index.get(name).map(|&i| &self.models[i])
    }

    pub(crate) fn as_slice(&self) -> &[Arc<DetectorModel>] {
        &self.models
    }
}
