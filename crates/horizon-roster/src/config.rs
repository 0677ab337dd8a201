//! Roster configuration, loadable from TOML.
//!
//! ```
//! use horizon_roster::config::RosterConfig;
//!
//! let config = RosterConfig::from_toml_str(r#"
//! [adapter]
//! pool_capacity = 8
//!
//! [[records]]
//! first_name = "Grace"
//! last_name = "Hopper"
//! age = 34
//! is_member = false
//! "#).unwrap();
//!
//! assert_eq!(config.adapter.pool_capacity, 8);
//! assert!(!config.adapter.placeholder_row);
//! assert_eq!(config.build_store().count(), 1);
//! ```

use std::path::Path;

use horizon_roster_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Record, RecordStore};

/// Default upper bound of pooled row bindings.
pub const DEFAULT_POOL_CAPACITY: usize = 32;

/// Settings for the recycling adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Maximum number of bindings kept associated with rows. Must be at
    /// least 1.
    pub pool_capacity: usize,
    /// Report one placeholder row while the store is empty, for hosts that
    /// cannot lay out zero rows.
    pub placeholder_row: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            placeholder_row: false,
        }
    }
}

impl AdapterConfig {
    /// Set the pool capacity.
    pub fn with_pool_capacity(mut self, pool_capacity: usize) -> Self {
        self.pool_capacity = pool_capacity;
        self
    }

    /// Set whether an empty store shows a placeholder row.
    pub fn with_placeholder_row(mut self, placeholder_row: bool) -> Self {
        self.placeholder_row = placeholder_row;
        self
    }

    /// Check the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.pool_capacity == 0 {
            return Err(Error::config("adapter.pool_capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Top-level configuration: adapter settings plus an optional seed data set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub adapter: AdapterConfig,
    pub records: Vec<Record>,
}

impl RosterConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| Error::config(e.to_string()))?;
        config.adapter.validate()?;
        Ok(config)
    }

    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(
            target: targets::CONFIG,
            path = %path.display(),
            records = config.records.len(),
            "loaded configuration"
        );
        Ok(config)
    }

    /// Render as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Write as pretty TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| Error::io(path, e))
    }

    /// A store seeded with the configured records.
    pub fn build_store(&self) -> RecordStore {
        RecordStore::from_records(self.records.clone())
    }
}
