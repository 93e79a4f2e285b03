//! Media player model, state mirror and remote commands

/// Typed remote commands
pub mod commands;
/// Command error types
pub mod error;
/// Normalized view of authoritative state
pub mod mirror;
/// Player and queue types
pub mod types;

pub use commands::{PlayerCommand, PlayerCommands};
pub use error::CommandError;
pub use mirror::{AvailabilityChange, NowPlaying, PlayerView, StateMirror};
pub use types::{
    ContentSource, PlaybackStatus, PlayerState, QueueItem, QueueSnapshot, RepeatMode,
};
