// Engine settings, loaded from an optional JSON file
use crate::error::EngineError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub delimiter: char,
    pub allocation_preview_rows: usize,
    pub dataset_preview_rows: usize,
    // Run the analysis components as independent blocking tasks.
    pub parallel: bool,
    pub log_filter: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            delimiter: ',',
            allocation_preview_rows: 10,
            dataset_preview_rows: 10,
            parallel: true,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineSettings {
    // No path means defaults; a path that can't be read or parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("Failed to read settings file '{}': {}", path.display(), e))
        })?;
        let settings = Self::from_json(&raw)?;
        tracing::debug!(path = %path.display(), ?settings, "Loaded engine settings");
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings = serde_json::from_str(raw)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn delimiter_byte(&self) -> Result<u8, EngineError> {
        if !self.delimiter.is_ascii() {
            return Err(EngineError::ConfigError(format!("Delimiter '{}' is not an ASCII character", self.delimiter)));
        }
        Ok(self.delimiter as u8)
    }

    fn validate(&self) -> Result<(), EngineError> {
        self.delimiter_byte()?;
        if self.log_filter.trim().is_empty() {
            return Err(EngineError::ConfigError("log_filter cannot be empty".to_string()));
        }
        Ok(())
    }
}
