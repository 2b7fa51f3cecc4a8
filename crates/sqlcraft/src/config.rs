//! Crate configuration.
//!
//! ```toml
//! dialect = "postgres"
//! cache_capacity = 128
//! ```

use crate::cache::QueryCache;
use crate::dialect::DialectKind;
use crate::error::{SqlError, SqlResult};
use crate::qb::QueryBuilder;
use serde::Deserialize;
use std::path::Path;

fn default_cache_capacity() -> usize {
    256
}

/// Dialect selection and cache sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Dialect new statements are bound to.
    #[serde(default)]
    pub dialect: DialectKind,
    /// Entries kept by [`Config::cache`]; zero disables caching.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectKind::default(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the query cache capacity.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn from_toml_str(raw: &str) -> SqlResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_json_str(raw: &str) -> SqlResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load a `.toml` or `.json` file; other extensions are read as TOML.
    pub fn load(path: impl AsRef<Path>) -> SqlResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SqlError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_toml_str(&raw)
        }
    }

    /// Statement factory bound to the configured dialect.
    pub fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.dialect.dialect())
    }

    /// An empty cache sized by `cache_capacity`.
    pub fn cache(&self) -> QueryCache {
        QueryCache::new(self.cache_capacity)
    }
}
