//! Runtime configuration loaded from YAML
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. The `MONGO_URI` environment variable overrides the file.

use crate::cluster::{KMeansConfig, TsneConfig};
use crate::graph::SimilarityGraphConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the MongoDB connection string
pub const MONGO_URI_VAR: &str = "MONGO_URI";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("MONGO_URI environment variable not set")]
    MissingMongoUri,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// A database/collection pair to read cards from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub database: String,
    pub collection: String,
}

impl SourceSpec {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mongo_uri: Option<String>,
    pub sources: Vec<SourceSpec>,
    pub graph: SimilarityGraphConfig,
    pub clustering: KMeansConfig,
    pub projection: TsneConfig,
    pub embedding_model: String,
    pub embedding_batch_size: usize,
    /// Longest search query accepted; longer input is truncated
    pub search_max_len: usize,
    /// Above this many concepts the overview shows only the largest component
    pub overview_node_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: None,
            sources: vec![
                SourceSpec::new("ragDB", "kengrams"),
                SourceSpec::new("nerDB", "kengrams"),
            ],
            graph: SimilarityGraphConfig::default(),
            clustering: KMeansConfig::default(),
            projection: TsneConfig::default(),
            embedding_model: "sentence-transformers/all-MiniLM-L12-v2".to_string(),
            embedding_batch_size: 32,
            search_max_len: 100,
            overview_node_limit: 200,
        }
    }
}

impl Config {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a YAML file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_yaml_str(&yaml)
    }

    /// `~/.config/thoughtnet/config.yaml` (or the platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("thoughtnet").join("config.yaml"))
    }

    /// Load from `path`, or from the default path when it exists, then
    /// apply the environment override
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        Ok(config.with_mongo_uri_override(std::env::var(MONGO_URI_VAR).ok()))
    }

    /// Replace the configured URI when `uri` is set and non-empty
    pub fn with_mongo_uri_override(mut self, uri: Option<String>) -> Self {
        if let Some(uri) = uri.filter(|u| !u.trim().is_empty()) {
            self.mongo_uri = Some(uri);
        }
        self
    }

    /// The connection string, for operations that need the database
    pub fn require_mongo_uri(&self) -> ConfigResult<&str> {
        self.mongo_uri
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingMongoUri)
    }
}
