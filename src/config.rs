use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::TrainReadyError;
use crate::logging::LogConfig;
use crate::progression::ProgressionConfig;
use crate::recommendations::RecommendationThresholds;
use crate::session_load::WorkloadConfig;
use crate::trends::TrendConfig;

/// Main application configuration
///
/// Every section is optional in the TOML file; missing ones take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Where history is persisted
    pub storage: StorageSettings,

    pub logging: LogConfig,

    /// Load progression thresholds and multipliers
    pub progression: ProgressionConfig,

    /// Survey scores at which recommendation rules fire
    pub recommendations: RecommendationThresholds,

    /// Recovery trend windows
    pub trends: TrendConfig,

    /// Session workload context windows
    pub workload: WorkloadConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file
    pub database_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("trainready")
                .join("trainready.db"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            storage: StorageSettings::default(),
            logging: LogConfig::default(),
            progression: ProgressionConfig::default(),
            recommendations: RecommendationThresholds::default(),
            trends: TrendConfig::default(),
            workload: WorkloadConfig::default(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trainready")
            .join("config.toml")
    }

    /// Load the default file, falling back to defaults when it is absent
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            debug!(path = %config_path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load an explicit file if given, otherwise the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_or_default(),
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> crate::error::Result<()> {
        let p = &self.progression;
        if !(p.poor_readiness < p.good_readiness && p.good_readiness <= p.excellent_readiness) {
            return Err(TrainReadyError::Configuration(
                "progression readiness thresholds must satisfy poor < good <= excellent".to_string(),
            ));
        }

        let multipliers = [
            p.standard_multiplier,
            p.excellent_multiplier,
            p.good_multiplier,
            p.deload_multiplier,
        ];
        if multipliers.iter().any(|m| m.is_sign_negative() || m.is_zero()) {
            return Err(TrainReadyError::Configuration(
                "progression multipliers must be positive".to_string(),
            ));
        }

        let r = &self.recommendations;
        if r.active_recovery_soreness > r.rest_day_soreness {
            return Err(TrainReadyError::Configuration(
                "recommendations.active_recovery_soreness must not exceed rest_day_soreness"
                    .to_string(),
            ));
        }

        if self.trends.window_size == 0 || self.trends.max_surveys < self.trends.window_size {
            return Err(TrainReadyError::Configuration(
                "trends.max_surveys must be at least trends.window_size, which must be positive"
                    .to_string(),
            ));
        }

        if self.workload.acute_days == 0 || self.workload.chronic_days < self.workload.acute_days {
            return Err(TrainReadyError::Configuration(
                "workload.chronic_days must be at least workload.acute_days, which must be positive"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.progression, deserialized.progression);
        assert_eq!(config.trends, deserialized.trends);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [progression]
            compound_start_load = 40

            [logging]
            level = "debug"

            [recommendations]
            poor_sleep = 6
            "#,
        )
        .unwrap();

        assert_eq!(config.recommendations.poor_sleep, 6);
        assert_eq!(config.recommendations.rest_day_soreness, 8);

        assert_eq!(config.progression.compound_start_load, dec!(40));
        assert_eq!(config.progression.isolation_start_load, dec!(10));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.workload, WorkloadConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original_config = AppConfig::default();
        original_config.storage.database_path = temp_dir.path().join("history.db");
        original_config.save_to_file(&config_path).unwrap();

        let loaded_config = AppConfig::load(Some(&config_path)).unwrap();
        assert_eq!(loaded_config.storage, original_config.storage);
        assert_eq!(loaded_config.progression, ProgressionConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        assert!(AppConfig::load(Some(&temp_dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut config = AppConfig::default();
        config.progression.poor_readiness = dec!(0.9);
        let err = config.validate().unwrap_err();
        assert_eq!(err.status_code(), 500);

        let mut config = AppConfig::default();
        config.workload.chronic_days = 3;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.recommendations.active_recovery_soreness = 9;
        assert!(config.validate().is_err());
    }
}
