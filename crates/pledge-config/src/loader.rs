//! Configuration Loader
//!
//! Handles loading configuration and applying environment overrides with proper precedence.

use crate::runtime::RuntimeConfig;
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the runtime configuration file
pub const CONFIG_FILE_NAME: &str = "pledge.toml";

/// Configuration loader
///
/// Loads configuration and merges sources with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Project config (./pledge.toml) - overrides defaults
/// 3. Environment variables (PLEDGE_*) - overrides project
pub struct ConfigLoader {
    /// Prefix for environment overrides
    env_prefix: String,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Runtime configuration
    pub runtime: RuntimeConfig,

    /// Directory where pledge.toml was found
    pub config_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            env_prefix: "PLEDGE".to_string(),
        }
    }

    /// Use a different prefix for environment overrides
    pub fn with_env_prefix(prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: prefix.into(),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find pledge.toml, then applies
    /// environment variable overrides.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (config_root, runtime) = self.find_runtime_config(start_dir)?;
        let runtime = self.apply_env_overrides(runtime)?;

        Ok(Config {
            runtime,
            config_root,
        })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let runtime = RuntimeConfig::load_from_file(config_path)?;
        let runtime = self.apply_env_overrides(runtime)?;

        Ok(Config {
            runtime,
            config_root: config_path.parent().map(|p| p.to_path_buf()),
        })
    }

    /// Find runtime configuration by walking up directory tree
    fn find_runtime_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, RuntimeConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.exists() {
                let config = RuntimeConfig::load_from_file(&config_path)?;
                return Ok((Some(current), config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, RuntimeConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides to runtime config
    ///
    /// Recognized: PLEDGE_TURN_BUDGET, PLEDGE_QUEUE_CAPACITY, PLEDGE_MAX_CHAIN_DEPTH
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> ConfigResult<RuntimeConfig> {
        if let Some(budget) = self.env_number::<u64>("TURN_BUDGET")? {
            config
                .scheduler
                .get_or_insert_with(Default::default)
                .turn_budget = Some(budget);
        }

        if let Some(capacity) = self.env_number::<usize>("QUEUE_CAPACITY")? {
            config
                .scheduler
                .get_or_insert_with(Default::default)
                .queue_capacity = Some(capacity);
        }

        if let Some(depth) = self.env_number::<usize>("MAX_CHAIN_DEPTH")? {
            config
                .resolution
                .get_or_insert_with(Default::default)
                .max_chain_depth = Some(depth);
        }

        config.validate()?;
        Ok(config)
    }

    fn env_number<T: std::str::FromStr>(&self, key: &str) -> ConfigResult<Option<T>> {
        let var = format!("{}_{}", self.env_prefix, key);
        match env::var(&var) {
            Ok(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidEnv { var, value }),
            Err(_) => Ok(None),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Get the directory holding pledge.toml
    pub fn config_root(&self) -> Option<&Path> {
        self.config_root.as_deref()
    }

    /// Check whether a pledge.toml was found
    pub fn has_config_file(&self) -> bool {
        self.config_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    #[serial]
    fn test_load_runtime_config() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[scheduler]\nturn_budget = 42\n");

        let loader = ConfigLoader::new();
        let config = loader.load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(config.runtime.turn_budget(), Some(42));
        assert!(config.has_config_file());
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[resolution]\nmax_chain_depth = 7\n");

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let loader = ConfigLoader::new();
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert_eq!(config.runtime.max_chain_depth(), Some(7));
        assert_eq!(config.config_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_env_override_turn_budget() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[scheduler]\nturn_budget = 42\n");

        env::set_var("PLEDGE_TURN_BUDGET", "9");
        let result = ConfigLoader::new().load_from_directory(temp_dir.path());
        env::remove_var("PLEDGE_TURN_BUDGET");

        assert_eq!(result.unwrap().runtime.turn_budget(), Some(9));
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("PLEDGE_MAX_CHAIN_DEPTH", "deep");
        let result = ConfigLoader::new().load_from_directory(temp_dir.path());
        env::remove_var("PLEDGE_MAX_CHAIN_DEPTH");

        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }
}
