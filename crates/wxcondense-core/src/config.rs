use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::PRECIPITATION_CODES;
use crate::schema::LcdSchema;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the condenser resolves the weather indicator for a date reported by
/// several stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherConsensus {
    /// First station row in input order.
    #[default]
    First,
    /// Most common value across stations; ties go to the first row.
    Majority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub precipitation_codes: Vec<String>,
    pub trace_tokens: Vec<String>,
    pub missing_tokens: Vec<String>,
    pub strip_chars: Vec<char>,
    pub rolling_window: usize,
    pub rolling_min_periods: usize,
    pub weather_consensus: WeatherConsensus,
    pub schema: LcdSchema,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            precipitation_codes: PRECIPITATION_CODES.iter().map(|c| c.to_string()).collect(),
            trace_tokens: vec!["T".to_string(), "Ts".to_string()],
            missing_tokens: vec![" ".to_string(), "*".to_string()],
            strip_chars: vec!['s', '*'],
            rolling_window: 5,
            rolling_min_periods: 1,
            weather_consensus: WeatherConsensus::First,
            schema: LcdSchema::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schema
            .check()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        if self.precipitation_codes.iter().all(|code| code.is_empty()) {
            return Err(ConfigError::Invalid(
                "precipitation_codes must contain at least one non-empty code".to_string(),
            ));
        }
        if self.rolling_window == 0 {
            return Err(ConfigError::Invalid(
                "rolling_window must be at least 1".to_string(),
            ));
        }
        if self.rolling_min_periods == 0 || self.rolling_min_periods > self.rolling_window {
            return Err(ConfigError::Invalid(format!(
                "rolling_min_periods must be between 1 and rolling_window ({})",
                self.rolling_window
            )));
        }
        Ok(())
    }
}
