//! Configuration parsing and validation
//!
//! The engine never touches the filesystem; hosts hand over configuration
//! text and choose the format.

use regex::Regex;

use super::engine_config::EngineConfiguration;
use crate::Result;
use crate::error::SharpstyleError;

/// Text format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

/// Parses and validates configuration documents
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse and validate a configuration document
    pub fn load_str(text: &str, format: ConfigFormat) -> Result<EngineConfiguration> {
        let config = match format {
            ConfigFormat::Toml => toml::from_str(text)?,
            ConfigFormat::Json => serde_json::from_str(text)?,
        };
        Self::validate(&config)?;
        tracing::debug!(?format, "Loaded engine configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<EngineConfiguration> {
        Self::load_str(text, ConfigFormat::Toml)
    }

    pub fn from_json_str(text: &str) -> Result<EngineConfiguration> {
        Self::load_str(text, ConfigFormat::Json)
    }

    /// Layer configurations; earlier entries take precedence
    pub fn merge_all(
        configs: impl IntoIterator<Item = EngineConfiguration>,
    ) -> Result<EngineConfiguration> {
        let mut merged = EngineConfiguration::default();
        for config in configs {
            merged.merge_with(config);
        }
        Self::validate(&merged)?;
        Ok(merged)
    }

    /// Reject values the engine cannot run with
    pub fn validate(config: &EngineConfiguration) -> Result<()> {
        for pattern in config.type_name_patterns() {
            Regex::new(pattern)?;
        }
        if config.cancellation_check_interval() == 0 {
            return Err(SharpstyleError::config_error(
                "dispatch.cancellationCheckInterval must be at least 1",
            ));
        }
        if config.max_passes() == 0 {
            return Err(SharpstyleError::config_error(
                "fix.maxPasses must be at least 1",
            ));
        }
        Ok(())
    }

    /// JSON schema of the configuration document
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(EngineConfiguration))
            .unwrap_or(serde_json::Value::Null)
    }
}
