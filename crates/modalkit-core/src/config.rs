#![forbid(unsafe_code)]

//! Store policy configuration.
//!
//! Policies can be built in code with the [`StoreConfig`] builder or, with
//! the `policy-config` feature, loaded from TOML:
//!
//! ```toml
//! collision_policy = "keep-existing"
//! ```

use serde::{Deserialize, Serialize};

/// What `open_modal` does when the instance id is already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Replace the existing entry in place (its position is kept).
    #[default]
    Overwrite,
    /// Leave the existing entry untouched; the open is dropped.
    KeepExisting,
}

/// Modal store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub collision_policy: CollisionPolicy,
}

impl StoreConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate-id policy.
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Parse a configuration from TOML.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration from a TOML file.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

/// Errors from loading a [`StoreConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[cfg(feature = "policy-config")]
    #[error("invalid store config: {0}")]
    Parse(#[from] toml::de::Error),
}
