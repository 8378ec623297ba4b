use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ConfigError;

/// Default lower bound for a meter reading value (inclusive)
pub const DEFAULT_MIN_VALUE: i64 = 0;
/// Default upper bound for a meter reading value (inclusive)
pub const DEFAULT_MAX_VALUE: i64 = 99999;

/// Tunable validation rules for ingestion
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    #[serde(rename = "minMeterReadingValue")]
    pub min_value: Decimal,
    #[serde(rename = "maxMeterReadingValue")]
    pub max_value: Decimal,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            min_value: Decimal::from(DEFAULT_MIN_VALUE),
            max_value: Decimal::from(DEFAULT_MAX_VALUE),
        }
    }
}

impl IngestConfig {
    /// Build a config with an explicit value range
    pub fn new(min_value: Decimal, max_value: Decimal) -> Result<Self, ConfigError> {
        let config = Self {
            min_value,
            max_value,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: IngestConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides on top of this config
    pub fn with_overrides(
        mut self,
        min_value: Option<Decimal>,
        max_value: Option<Decimal>,
    ) -> Result<Self, ConfigError> {
        if let Some(min) = min_value {
            self.min_value = min;
        }
        if let Some(max) = max_value {
            self.max_value = max;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_value > self.max_value {
            return Err(ConfigError::InvalidRange {
                min: self.min_value,
                max: self.max_value,
            });
        }
        Ok(())
    }
}
