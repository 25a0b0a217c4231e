// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! I/O utilities for loading network output tensors and saving results.
//!
//! Tensors use ndarray's serde representation:
//! `{"v": 1, "dim": [channels, height, width], "data": [...]}`.

use std::fs;
use std::path::Path;

use ndarray::{Array3, Array4};
use serde::Serialize;

use crate::error::{PoseError, Result};

/// Load a `(channels, height, width)` tensor from a JSON file.
///
/// # Errors
///
/// Returns [`PoseError::Io`] if the file cannot be read and
/// [`PoseError::JsonError`] if it is not a valid 3-D tensor.
pub fn load_tensor3<P: AsRef<Path>>(path: P) -> Result<Array3<f32>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Load a `(batch, channels, height, width)` tensor from a JSON file.
///
/// # Errors
///
/// Same as [`load_tensor3`].
pub fn load_tensor4<P: AsRef<Path>>(path: P) -> Result<Array4<f32>> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Write any serializable value as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            PoseError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create directory {}: {e}", parent.display()),
            ))
        })?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}
