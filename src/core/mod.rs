use std::path::Path;

use thiserror::Error;

use crate::services::media_player::CommandError;

/// Error types for the player card.
///
/// Configuration variants are fatal at setup and halt initialization.
/// Command failures are recoverable and normally surface as a transient
/// notice instead of reaching the caller.
#[derive(Error, Debug)]
pub enum CardError {
    /// The required target entity was not configured
    #[error("please define an entity")]
    MissingEntity,

    /// Configuration field is present but invalid
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig {
        /// The field that is invalid
        field: String,
        /// Reason why the field is invalid
        reason: String,
    },

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParse {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An outbound command failed
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// A specialized `Result` type for card operations.
pub type Result<T> = std::result::Result<T, CardError>;

impl CardError {
    /// Creates a TOML parsing error with optional file path context.
    pub fn toml_parse(error: impl std::fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => p.to_string_lossy().to_string(),
            None => "string".to_string(),
        };

        CardError::TomlParse {
            location,
            details: error.to_string(),
        }
    }

    /// Whether this error must halt card initialization.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CardError::Command(_))
    }
}
