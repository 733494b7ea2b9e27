//! Pledge Configuration System
//!
//! Provides configuration for the pledge future runtime:
//! - Runtime configuration file (pledge.toml)
//! - Scheduler limits (turn budget, queue capacity)
//! - Resolution limits (maximum chain depth)
//! - Environment variable overrides
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Project config (./pledge.toml, searched upward)
//! 3. Environment variables (PLEDGE_*)
//!
//! # Example
//!
//! ```no_run
//! use pledge_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("turn budget: {:?}", config.runtime.turn_budget());
//! ```

pub mod loader;
pub mod runtime;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid value '{value}' for environment variable {var}")]
    InvalidEnv { var: String, value: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use runtime::{ResolutionConfig, RuntimeConfig, SchedulerConfig};
