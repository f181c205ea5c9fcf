use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::engine::{
    DEFAULT_ENGINE_PATH, Engine, FileName, MAX_TIMEOUT_SECS, SHELL_ESCAPE_FLAGS, check_timeout,
    is_shell_escape_flag,
};

pub mod engine;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../texcube.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("engine '{0}' not found in configuration")]
    EngineNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Texcube
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory under which workspaces are created (system temp dir if unset)
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,

    /// Upper bound on simultaneous compilations
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Engine used when a request does not name one
    #[serde(default = "default_engine_id")]
    pub default_engine: String,

    /// Engine configurations keyed by engine ID
    #[serde(default)]
    pub engines: HashMap<String, Engine>,
}

impl Config {
    /// Create a new config with the embedded default engines
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config holding a single engine, which becomes the default
    pub fn with_engine(id: impl Into<String>, engine: Engine) -> Self {
        let id = id.into();
        Self {
            scratch_root: None,
            max_concurrent: default_max_concurrent(),
            default_engine: id.clone(),
            engines: HashMap::from([(id, engine)]),
        }
    }

    /// Get an engine by ID
    pub fn get_engine(&self, id: &str) -> Result<&Engine, ConfigError> {
        self.engines
            .get(id)
            .ok_or_else(|| ConfigError::EngineNotFound(id.to_string()))
    }

    /// Get the engine for `id`, or the default engine when `id` is `None`
    pub fn engine_or_default(&self, id: Option<&str>) -> Result<&Engine, ConfigError> {
        self.get_engine(id.unwrap_or(self.default_engine.as_str()))
    }

    /// Directory workspaces are created under
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_engine_id() -> String {
    "pdflatex".to_owned()
}
