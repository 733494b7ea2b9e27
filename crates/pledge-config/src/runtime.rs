//! Runtime Configuration (pledge.toml)
//!
//! Handles the `[scheduler]` and `[resolution]` tables that tune the event
//! loop and the settlement resolution procedure.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default initial capacity of the event loop job queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Upper bound accepted for `scheduler.queue_capacity`
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

/// Runtime configuration from pledge.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Scheduler settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerConfig>,

    /// Resolution procedure settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionConfig>,
}

/// Scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Maximum number of turns a single `run_until_idle` may execute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_budget: Option<u64>,

    /// Initial capacity of the job queue (default: 64)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
}

/// Resolution procedure settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ResolutionConfig {
    /// Maximum number of resolution steps spent settling one future
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chain_depth: Option<usize>,
}

impl RuntimeConfig {
    /// Load runtime configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML source
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::TomlParseError {
            file: "<inline>".into(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the runtime configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(scheduler) = &self.scheduler {
            if scheduler.turn_budget == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "scheduler.turn_budget".to_string(),
                    reason: "budget must be at least 1".to_string(),
                });
            }
            if let Some(capacity) = scheduler.queue_capacity {
                if capacity > MAX_QUEUE_CAPACITY {
                    return Err(ConfigError::InvalidValue {
                        field: "scheduler.queue_capacity".to_string(),
                        reason: format!("{} exceeds the maximum of {}", capacity, MAX_QUEUE_CAPACITY),
                    });
                }
            }
        }

        if let Some(resolution) = &self.resolution {
            if resolution.max_chain_depth == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "resolution.max_chain_depth".to_string(),
                    reason: "depth must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Turn budget for one `run_until_idle`, if bounded
    pub fn turn_budget(&self) -> Option<u64> {
        self.scheduler.as_ref().and_then(|s| s.turn_budget)
    }

    /// Initial job queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.scheduler
            .as_ref()
            .and_then(|s| s.queue_capacity)
            .unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    /// Resolution step limit per future, if bounded
    pub fn max_chain_depth(&self) -> Option<usize> {
        self.resolution.as_ref().and_then(|r| r.max_chain_depth)
    }

    /// Merge another runtime config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &RuntimeConfig) {
        if let Some(other_sched) = &other.scheduler {
            let sched = self.scheduler.get_or_insert_with(Default::default);
            if other_sched.turn_budget.is_some() {
                sched.turn_budget = other_sched.turn_budget;
            }
            if other_sched.queue_capacity.is_some() {
                sched.queue_capacity = other_sched.queue_capacity;
            }
        }
        if let Some(other_res) = &other.resolution {
            let res = self.resolution.get_or_insert_with(Default::default);
            if other_res.max_chain_depth.is_some() {
                res.max_chain_depth = other_res.max_chain_depth;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_runtime_config() {
        let toml = r#"
[scheduler]
turn_budget = 500
"#;

        let config: RuntimeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.turn_budget(), Some(500));
        assert_eq!(config.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.max_chain_depth(), None);
    }

    #[test]
    fn test_parse_full_runtime_config() {
        let toml = r#"
[scheduler]
turn_budget = 100000
queue_capacity = 256

[resolution]
max_chain_depth = 32
"#;

        let config = RuntimeConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.turn_budget(), Some(100_000));
        assert_eq!(config.queue_capacity(), 256);
        assert_eq!(config.max_chain_depth(), Some(32));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RuntimeConfig::from_toml_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.turn_budget(), None);
    }

    #[test]
    fn test_zero_turn_budget_rejected() {
        let config = RuntimeConfig {
            scheduler: Some(SchedulerConfig {
                turn_budget: Some(0),
                queue_capacity: None,
            }),
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "scheduler.turn_budget"
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = RuntimeConfig::from_toml_str("[scheduler]\nturbo = true\n");
        assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
    }

    #[test]
    fn test_merge_configs() {
        let mut base = RuntimeConfig::from_toml_str(
            "[scheduler]\nturn_budget = 10\nqueue_capacity = 8\n",
        )
        .unwrap();
        let override_config = RuntimeConfig {
            scheduler: Some(SchedulerConfig {
                turn_budget: Some(99),
                queue_capacity: None,
            }),
            resolution: Some(ResolutionConfig {
                max_chain_depth: Some(4),
            }),
        };

        base.merge(&override_config);
        assert_eq!(base.turn_budget(), Some(99));
        assert_eq!(base.queue_capacity(), 8);
        assert_eq!(base.max_chain_depth(), Some(4));
    }
}
