use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use super::{CommandError, RepeatMode};
use crate::services::hass::{EntityId, Hass};

/// Remote operations the card can request from the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Start playback
    Play,

    /// Pause playback
    Pause,

    /// Skip to next track
    NextTrack,

    /// Go to previous track
    PreviousTrack,

    /// Seek to an absolute position in seconds
    Seek(f64),

    /// Set volume in `[0, 1]`
    SetVolume(f64),

    /// Mute or unmute
    SetMute(bool),

    /// Set shuffle
    SetShuffle(bool),

    /// Set repeat mode
    SetRepeat(RepeatMode),

    /// Ask the queue helper to publish the queue
    FetchQueue,

    /// Ask the host to poll the entity now
    Refresh,

    /// Flip a boolean entity
    Toggle,
}

impl PlayerCommand {
    /// Host service domain.
    pub fn domain(&self) -> &'static str {
        match self {
            Self::FetchQueue => "sonos_helper",
            Self::Refresh => "homeassistant",
            Self::Toggle => "input_boolean",
            _ => "media_player",
        }
    }

    /// Host service name.
    pub fn service(&self) -> &'static str {
        match self {
            Self::Play => "media_play",
            Self::Pause => "media_pause",
            Self::NextTrack => "media_next_track",
            Self::PreviousTrack => "media_previous_track",
            Self::Seek(_) => "media_seek",
            Self::SetVolume(_) => "volume_set",
            Self::SetMute(_) => "volume_mute",
            Self::SetShuffle(_) => "shuffle_set",
            Self::SetRepeat(_) => "repeat_set",
            Self::FetchQueue => "get_queue",
            Self::Refresh => "update_entity",
            Self::Toggle => "toggle",
        }
    }

    /// Call parameters for `target`.
    pub fn data(&self, target: &EntityId) -> Value {
        let mut data = json!({ "entity_id": target.as_str() });
        let extra = match *self {
            Self::Seek(position) => Some(("seek_position", json!(position))),
            Self::SetVolume(level) => Some(("volume_level", json!(level))),
            Self::SetMute(muted) => Some(("is_volume_muted", json!(muted))),
            Self::SetShuffle(shuffle) => Some(("shuffle", json!(shuffle))),
            Self::SetRepeat(mode) => Some(("repeat", json!(mode.as_str()))),
            _ => None,
        };
        if let (Some((key, value)), Some(map)) = (extra, data.as_object_mut()) {
            map.insert(key.to_string(), value);
        }
        data
    }
}

/// Issues [`PlayerCommand`]s against the host service bus.
#[derive(Clone)]
pub struct PlayerCommands {
    hass: Arc<dyn Hass>,
}

impl PlayerCommands {
    /// Wrap a host.
    pub fn new(hass: Arc<dyn Hass>) -> Self {
        Self { hass }
    }

    /// Issue `command` for `target` and wait for it to settle.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Failed` if the host rejects the call. The
    /// failure is logged here; callers decide what the user sees.
    pub async fn send(&self, target: &EntityId, command: PlayerCommand) -> Result<(), CommandError> {
        let domain = command.domain();
        let service = command.service();
        info!(%target, "{domain}.{service}");

        self.hass
            .call_service(domain, service, command.data(target))
            .await
            .map_err(|source| {
                warn!(%target, error = %source, "{domain}.{service} rejected");
                CommandError::Failed {
                    command: service,
                    source,
                }
            })
    }
}
