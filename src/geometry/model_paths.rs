use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::model::model_name;

/// Extension of model files inside a model directory.
pub const MODEL_SUFFIX: &str = "conf";

/// Directory holding the models shipped with the crate.
pub const BUILTIN_MODEL_DIRECTORY: &str = match option_env!("ALLPIX_MODEL_DIRECTORY") {
    Some(directory) => directory,
    None => concat!(env!("CARGO_MANIFEST_DIR"), "/models"),
};

const PROJECT_NAME: &str = "allpix";
const DEFAULT_DATA_DIRS: &str = "/usr/local/share/:/usr/share/";

/// A model file found on the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    /// Model type name, the file stem.
    pub name: String,
    /// Location of the file.
    pub path: PathBuf,
}

impl ModelFile {
    fn new(path: PathBuf) -> Result<Self, ConfigError> {
        let name = model_name(&path)?;
        Ok(Self { name, path })
    }
}

/// Returns the standard model directories that exist, in priority order.
///
/// These are the built-in model directory followed by `allpix/models` below
/// every entry of `data_dirs`, a colon separated list as found in
/// `XDG_DATA_DIRS`. An unset or empty list falls back to
/// `/usr/local/share/:/usr/share/`.
#[must_use]
pub fn default_model_paths(data_dirs: Option<&str>) -> Vec<PathBuf> {
    let data_dirs = data_dirs
        .filter(|dirs| !dirs.is_empty())
        .unwrap_or(DEFAULT_DATA_DIRS);

    std::iter::once(PathBuf::from(BUILTIN_MODEL_DIRECTORY))
        .chain(
            data_dirs
                .split(':')
                .filter(|dir| !dir.is_empty())
                .map(|dir| Path::new(dir).join(PROJECT_NAME).join("models")),
        )
        .filter(|path| path.is_dir())
        .collect()
}

/// Lists the model files reachable from `paths`, in priority order.
///
/// Directories contribute every file with the model suffix, sorted by name;
/// any other path is taken as a model file itself.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed or a path has no file
/// name to take the model name from.
pub fn model_files(paths: &[PathBuf]) -> Result<Vec<ModelFile>, ConfigError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(ModelFile::new(path.clone())?);
            continue;
        }

        let io_error = |source| ConfigError::Io {
            path: path.clone(),
            source,
        };
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(io_error)? {
            let entry_path = entry.map_err(io_error)?.path();
            let is_model = entry_path.is_file()
                && entry_path.extension().is_some_and(|ext| ext == MODEL_SUFFIX);
            if is_model {
                entries.push(entry_path);
            }
        }
        entries.sort();
        for entry in entries {
            files.push(ModelFile::new(entry)?);
        }
    }
    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn directories_list_sorted_model_files_only() {
        let dir = TempDir::new().unwrap();
        for name in ["b.conf", "a.conf", "notes.txt", "c.conf.bak"] {
            File::create(dir.path().join(name)).unwrap();
        }
        fs::create_dir(dir.path().join("nested.conf")).unwrap();

        let files = model_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn explicit_files_keep_their_position() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.model");
        File::create(&explicit).unwrap();
        let models = dir.path().join("models");
        fs::create_dir(&models).unwrap();
        File::create(models.join("timepix.conf")).unwrap();

        let files = model_files(&[models, explicit.clone()]).unwrap();
        assert_eq!(files[0].name, "timepix");
        assert_eq!(files[1], ModelFile { name: "custom".to_owned(), path: explicit });
    }

    #[test]
    fn path_without_file_name_is_an_error() {
        let dir = TempDir::new().unwrap();
        let nameless = dir.path().join("absent").join("..");
        assert!(matches!(
            model_files(&[nameless]),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn data_dirs_resolve_to_project_model_directories() {
        let dir = TempDir::new().unwrap();
        let models = dir.path().join("allpix").join("models");
        fs::create_dir_all(&models).unwrap();
        let missing = dir.path().join("missing");

        let data_dirs = format!("{}:{}", missing.display(), dir.path().display());
        let paths = default_model_paths(Some(&data_dirs));
        assert!(paths.contains(&models));
        assert!(!paths.iter().any(|p| p.starts_with(&missing)));
    }

    #[test]
    fn builtin_directory_comes_first() {
        let paths = default_model_paths(Some(""));
        if Path::new(BUILTIN_MODEL_DIRECTORY).is_dir() {
            assert_eq!(paths[0], PathBuf::from(BUILTIN_MODEL_DIRECTORY));
        }
    }
}
