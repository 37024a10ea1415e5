//! TOML configuration files

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{Error, Result};

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded configuration from {}", path.display());
    toml::from_str(&text).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })
}

/// Read a TOML file if a path is given, otherwise use the type's default
pub fn load_toml_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => load_toml(path),
        None => Ok(T::default()),
    }
}
