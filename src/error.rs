use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the geometry subsystem.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Errors raised while reading or interpreting configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {file} at line {line}: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    #[error("key '{key}' in section '{section}' does not exist")]
    MissingKey { section: String, key: String },

    #[error("could not convert value '{value}' of key '{key}' in section '{section}': {reason}")]
    InvalidType {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("value of key '{key}' in section '{section}' is not valid: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },
}

/// Errors related to the detector registry and its lifecycle.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("geometry is already closed before adding {0}")]
    GeometryClosed(&'static str),

    #[error("geometry has not been closed yet")]
    GeometryOpen,

    #[error("could not find a detector with name '{0}'")]
    InvalidDetector(String),

    #[error("could not find a detector model of type '{0}'")]
    InvalidModel(String),

    #[error("detector with name {0} is already registered, detector names should be unique")]
    DetectorExists(String),

    #[error("model with type {0} is already registered, model names should be unique")]
    DetectorModelExists(String),

    #[error("detector name {0} is invalid, choose a different name")]
    DetectorInvalidName(String),

    #[error("magnetic field has already been set")]
    MagneticFieldAlreadySet,
}

/// Convenience type alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
