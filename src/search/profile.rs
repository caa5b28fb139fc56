//! Connection profiles.
//!
//! A profile is a JSON file holding the engine host, optional credentials
//! and the index configurations that `create_index_from_profile` can use:
//!
//! ```json
//! {
//!   "host": "https://localhost:9200",
//!   "auth": { "ca_certs": "certs/ca.crt", "username": "elastic", "password": "..." },
//!   "indices": [ { "index": "articles", "settings": {}, "scheme": {} } ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LexisError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub host: String,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub indices: Vec<IndexConfig>,
}

/// Credentials. An empty object means an unauthenticated connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Auth {
    #[serde(default)]
    pub ca_certs: Option<PathBuf>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Auth {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ca_certs.is_none() && self.username.is_none() && self.password.is_none()
    }
}

/// A named index template: settings plus the field mapping (`scheme`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub index: String,
    #[serde(default)]
    pub settings: Value,
    #[serde(default)]
    pub scheme: Value,
}

impl IndexConfig {
    /// Body for `PUT /{index}`.
    #[must_use]
    pub fn create_body(&self) -> Value {
        serde_json::json!({
            "settings": self.settings,
            "mappings": {
                "properties": self.scheme
            }
        })
    }
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            LexisError::MissingConfig(format!("read profile {}: {err}", path.display()))
        })?;
        let mut profile: Self = serde_json::from_str(&raw).map_err(|err| {
            LexisError::Config(format!("parse profile {}: {err}", path.display()))
        })?;

        // Certificate paths are relative to the profile file.
        if let (Some(ca), Some(parent)) = (profile.auth.ca_certs.as_mut(), path.parent()) {
            if ca.is_relative() {
                *ca = parent.join(&*ca);
            }
        }
        if profile.host.trim().is_empty() {
            return Err(LexisError::Config(format!(
                "profile {} has an empty host",
                path.display()
            )));
        }
        Ok(profile)
    }

    #[must_use]
    pub fn index_names(&self) -> Vec<&str> {
        self.indices.iter().map(|index| index.index.as_str()).collect()
    }

    pub fn index_config(&self, name: &str) -> Result<&IndexConfig> {
        self.indices
            .iter()
            .find(|index| index.index == name)
            .ok_or_else(|| {
                LexisError::NotFound(format!(
                    "index configuration {name} (available: {})",
                    self.index_names().join(", ")
                ))
            })
    }
}
