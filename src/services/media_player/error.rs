use crate::services::hass::{EntityId, HassError};

/// Errors that can occur while commanding a media player
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The host rejected the command
    #[error("{command} failed: {source}")]
    Failed {
        /// Command that failed
        command: &'static str,
        /// Host error
        source: HassError,
    },

    /// Seek requested while the track duration is unknown
    #[error("media duration not available")]
    MissingDuration,

    /// The target player is not available
    #[error("player {0} not available")]
    Unavailable(EntityId),
}

impl CommandError {
    /// Service name of the command the host rejected.
    pub fn command(&self) -> Option<&'static str> {
        match self {
            Self::Failed { command, .. } => Some(*command),
            _ => None,
        }
    }
}
