//! Card configuration schema, validation and loading.
//!
//! The host supplies the configuration once at setup. Only `entity` is
//! required; every other field has a default.

mod log_level;
mod timing;

#[cfg(test)]
mod tests;

pub use log_level::LogLevel;
pub use timing::TimingConfig;

use std::{fs, path::Path};

use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};

use crate::{CardError, Result};

/// Entity used by the catalog preview before the user picks a player.
pub const STUB_ENTITY: &str = "input_boolean.twgc";

/// Configuration for a single player card instance.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(default)]
pub struct CardConfig {
    /// Media player entity, or a helper entity whose state names the media player.
    pub entity: Option<String>,

    /// Optional card header. Empty means no header.
    pub header: Option<String>,

    /// Logging verbosity for the simulator and embedding applications.
    pub log_level: LogLevel,

    /// Timer durations used by the card.
    pub timing: TimingConfig,
}

impl CardConfig {
    /// Build a config targeting `entity` with default timings.
    pub fn for_entity(entity: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            ..Default::default()
        }
    }

    /// Placeholder configuration offered to the card catalog.
    pub fn stub() -> Self {
        Self {
            entity: Some(STUB_ENTITY.to_string()),
            header: Some(String::new()),
            ..Default::default()
        }
    }

    /// Check the configuration, returning the target entity on success.
    ///
    /// # Errors
    ///
    /// Returns `CardError::MissingEntity` when no entity is set and
    /// `CardError::InvalidConfig` for malformed values.
    pub fn validate(&self) -> Result<&str> {
        let entity = match self.entity.as_deref().map(str::trim) {
            Some(entity) if !entity.is_empty() => entity,
            _ => return Err(CardError::MissingEntity),
        };

        if !entity.contains('.') {
            return Err(CardError::InvalidConfig {
                field: "entity".to_string(),
                reason: format!("'{entity}' is not a <domain>.<object_id> identifier"),
            });
        }

        self.timing.validate()?;
        Ok(entity)
    }

    /// Header text, if one should be shown.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref().filter(|h| !h.is_empty())
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns a parse error for invalid TOML and a validation error for
    /// an incomplete configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::parse(content, None)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `CardError::Io` if the file cannot be read, otherwise the
    /// same errors as [`CardConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, Some(path))
    }

    fn parse(content: &str, path: Option<&Path>) -> Result<Self> {
        let config: CardConfig =
            toml::from_str(content).map_err(|e| CardError::toml_parse(e, path))?;
        config.validate()?;
        Ok(config)
    }

    /// JSON schema for a graphical configuration editor.
    pub fn json_schema() -> Schema {
        schema_for!(CardConfig)
    }
}
