// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for the pose parsing library.

use std::fmt;

/// Result type alias for parsing operations.
pub type Result<T> = std::result::Result<T, PoseError>;

/// Main error type for the pose parsing library.
#[derive(Debug)]
pub enum PoseError {
    /// Invalid topology, tuning parameter or coordinate scale.
    ///
    /// Raised while setting up a parser, never from inside a parse call.
    ConfigError(String),
    /// Tensor channel counts or spatial dimensions do not match the topology.
    ShapeMismatch(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
    /// Tensor or result JSON could not be (de)serialized.
    JsonError(String),
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::ShapeMismatch(msg) => write!(f, "Shape mismatch: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::JsonError(msg) => write!(f, "JSON error: {msg}"),
        }
    }
}

impl std::error::Error for PoseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PoseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}
