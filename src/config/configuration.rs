use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::value::FromConfigValue;

/// A named section of key/value settings.
///
/// Values are kept as raw text and converted on access, so a section can be
/// copied into another one without losing precision or units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    name: String,
    path: Option<PathBuf>,
    settings: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates an empty section. An empty name denotes a header section.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            settings: BTreeMap::new(),
        }
    }

    /// Creates an empty section originating from the file at `path`.
    #[must_use]
    pub fn with_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
            settings: BTreeMap::new(),
        }
    }

    /// Returns the section name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the key is defined.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    /// Returns the number of settings in this section.
    #[must_use]
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Returns whether the section holds no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Converts the value of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or cannot be converted.
    pub fn get<T: FromConfigValue>(&self, key: &str) -> Result<T, ConfigError> {
        let text = self.text(key)?;
        T::from_config_value(text).map_err(|reason| ConfigError::InvalidType {
            section: self.label(),
            key: key.to_owned(),
            value: text.to_owned(),
            reason,
        })
    }

    /// Converts the value of `key`, or returns `default` if it is not defined.
    ///
    /// # Errors
    ///
    /// Returns an error if the key exists but cannot be converted.
    pub fn get_or<T: FromConfigValue>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        if self.has(key) {
            self.get(key)
        } else {
            Ok(default)
        }
    }

    /// Returns the raw text of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist.
    pub fn text(&self, key: &str) -> Result<&str, ConfigError> {
        self.settings
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingKey {
                section: self.label(),
                key: key.to_owned(),
            })
    }

    /// Sets the raw text of `key`, replacing any previous value.
    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    /// Adds every setting of `other` that is not yet defined here.
    pub fn merge(&mut self, other: &Configuration) {
        for (key, value) in &other.settings {
            self.settings
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Iterates over all settings in key order.
    pub fn settings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.settings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the list of paths stored under `key`.
    ///
    /// Relative paths are resolved against the directory of the file this
    /// section was read from.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist, or if `check_exists` is set
    /// and one of the paths cannot be found.
    pub fn path_array(&self, key: &str, check_exists: bool) -> Result<Vec<PathBuf>, ConfigError> {
        let elements: Vec<String> = self.get(key)?;

        let base = self.path.as_deref().and_then(Path::parent);
        elements
            .into_iter()
            .map(|element| {
                let path = PathBuf::from(element);
                let path = match base {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path,
                };
                if !check_exists {
                    return Ok(path);
                }
                path.canonicalize().map_err(|_| {
                    self.invalid_value(key, &format!("path {} does not exist", path.display()))
                })
            })
            .collect()
    }

    /// Builds an error describing an unacceptable value of `key`.
    #[must_use]
    pub fn invalid_value(&self, key: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.label(),
            key: key.to_owned(),
            reason: reason.to_owned(),
        }
    }

    fn label(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "header".to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Vector2;

    #[test]
    fn typed_access_and_defaults() {
        let mut config = Configuration::new("det");
        config.set_text("sensor_thickness", "300um");
        assert_relative_eq!(config.get::<f64>("sensor_thickness").unwrap(), 0.3);
        assert_relative_eq!(config.get_or("chip_thickness", 0.7).unwrap(), 0.7);
        assert!(matches!(
            config.get::<f64>("missing"),
            Err(ConfigError::MissingKey { .. })
        ));
    }

    #[test]
    fn conversion_failure_names_the_key() {
        let mut config = Configuration::new("det");
        config.set_text("pixel_size", "55um");
        let err = config.get::<Vector2>("pixel_size").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidType { ref key, .. } if key == "pixel_size"));
    }

    #[test]
    fn merge_keeps_existing_values() {
        let mut first = Configuration::new("");
        first.set_text("a", "1");
        let mut second = Configuration::new("");
        second.set_text("a", "2");
        second.set_text("b", "3");

        first.merge(&second);
        assert_eq!(first.text("a").unwrap(), "1");
        assert_eq!(first.text("b").unwrap(), "3");
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn relative_paths_resolve_against_file() {
        let mut config = Configuration::with_path("", "/opt/setup/main.conf");
        config.set_text("model_paths", "models \"/abs/dir\"");
        let paths = config.path_array("model_paths", false).unwrap();
        assert_eq!(
            paths,
            vec![PathBuf::from("/opt/setup/models"), PathBuf::from("/abs/dir")]
        );
    }

    #[test]
    fn unterminated_path_list_is_a_type_error() {
        let mut config = Configuration::new("");
        config.set_text("model_paths", "models \"/abs/dir");
        assert!(matches!(
            config.path_array("model_paths", false),
            Err(ConfigError::InvalidType { ref key, .. }) if key == "model_paths"
        ));
    }

    #[test]
    fn missing_path_is_rejected_when_checked() {
        let mut config = Configuration::new("");
        config.set_text("model_paths", "/definitely/not/here");
        assert!(config.path_array("model_paths", true).is_err());
    }
}
