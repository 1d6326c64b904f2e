use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_cycles: must be at least 1")]
    InvalidMaxCycles,

    #[error("Invalid epsilon {0}: must be within (0, 1]")]
    InvalidEpsilon(f64),

    #[error("Invalid epsilon_min {0}: must be within [0, epsilon_initial]")]
    InvalidEpsilonMin(f64),

    #[error("Invalid epsilon_decay {0}: must be within (0, 1]")]
    InvalidEpsilonDecay(f64),

    #[error("Invalid timeout bounds: min_timeout_ms ({0}) must be below max_timeout_ms ({1})")]
    InvalidTimeoutBounds(u32, u32),

    #[error("Invalid healthy_threshold {0}: must be within (0, 1]")]
    InvalidHealthyThreshold(f64),

    #[error("Invalid cost_budget {0}: must be positive")]
    InvalidCostBudget(f64),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: must be at least 1")]
    InvalidMaxConnections,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Oracle enabled but no api_key configured")]
    MissingOracleApiKey,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .mender/config.yaml (project config)
    /// 3. Environment variables (MENDER_* prefix, highest priority)
    ///
    /// Configuration is project-local (pwd/.mender/) so multiple agents
    /// on one machine can learn against different stores.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".mender/config.yaml"))
            .merge(Env::prefixed("MENDER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("MENDER_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let learning = &config.learning;
        if learning.max_cycles == 0 {
            return Err(ConfigError::InvalidMaxCycles);
        }
        if learning.epsilon_initial <= 0.0 || learning.epsilon_initial > 1.0 {
            return Err(ConfigError::InvalidEpsilon(learning.epsilon_initial));
        }
        if learning.epsilon_min < 0.0 || learning.epsilon_min > learning.epsilon_initial {
            return Err(ConfigError::InvalidEpsilonMin(learning.epsilon_min));
        }
        if learning.epsilon_decay <= 0.0 || learning.epsilon_decay > 1.0 {
            return Err(ConfigError::InvalidEpsilonDecay(learning.epsilon_decay));
        }

        let guardrails = &config.guardrails;
        if guardrails.min_timeout_ms >= guardrails.max_timeout_ms {
            return Err(ConfigError::InvalidTimeoutBounds(
                guardrails.min_timeout_ms,
                guardrails.max_timeout_ms,
            ));
        }
        if guardrails.healthy_threshold <= 0.0 || guardrails.healthy_threshold > 1.0 {
            return Err(ConfigError::InvalidHealthyThreshold(guardrails.healthy_threshold));
        }
        if guardrails.cost_budget <= 0.0 {
            return Err(ConfigError::InvalidCostBudget(guardrails.cost_budget));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.oracle.enabled && config.oracle.api_key.is_none() {
            return Err(ConfigError::MissingOracleApiKey);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        GuardrailConfig, LearningConfig, LoggingConfig, OracleConfig,
    };

    #[test]
    fn defaults_validate() {
        assert!(ConfigLoader::validate(&Config::default()).is_ok());
    }

    #[test]
    fn zero_cycles_rejected() {
        let config = Config {
            learning: LearningConfig {
                max_cycles: 0,
                ..LearningConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxCycles)
        ));
    }

    #[test]
    fn out_of_range_epsilon_rejected() {
        let config = Config {
            learning: LearningConfig {
                epsilon_initial: 1.5,
                ..LearningConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidEpsilon(_))
        ));

        let config = Config {
            learning: LearningConfig {
                epsilon_min: 0.9, // above epsilon_initial (0.2)
                ..LearningConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidEpsilonMin(_))
        ));
    }

    #[test]
    fn inverted_timeout_bounds_rejected() {
        let config = Config {
            guardrails: GuardrailConfig {
                min_timeout_ms: 60_000,
                max_timeout_ms: 500,
                ..GuardrailConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeoutBounds(_, _))
        ));
    }

    #[test]
    fn oracle_without_key_rejected() {
        let config = Config {
            oracle: OracleConfig {
                enabled: true,
                api_key: None,
                ..OracleConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::MissingOracleApiKey)
        ));
    }

    #[test]
    fn bad_log_level_rejected() {
        let config = Config {
            logging: LoggingConfig {
                level: "verbose".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }
}
