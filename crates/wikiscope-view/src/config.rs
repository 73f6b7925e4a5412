//! View configuration loaded from TOML

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::queue::QueuePolicy;

/// Per-view settings.
///
/// ```toml
/// policy = "supersede"
///
/// [options]
/// physics = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub policy: QueuePolicy,
    /// Opaque options forwarded to the rendering surface.
    pub options: Value,
}

impl ViewConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No view config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
