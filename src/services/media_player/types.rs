use std::fmt;

use serde_json::Value;

use crate::services::hass::{EntityId, EntityState};

const UNKNOWN: &str = "Unknown";

/// Current playback status reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Playing
    Playing,

    /// Paused
    Paused,

    /// Powered on with nothing loaded
    Idle,

    /// Powered off or stopped
    #[default]
    Off,

    /// Not reachable
    Unavailable,
}

impl From<&str> for PlaybackStatus {
    fn from(status: &str) -> Self {
        match status {
            "playing" => Self::Playing,
            "paused" | "buffering" => Self::Paused,
            "idle" => Self::Idle,
            "unavailable" | "unknown" => Self::Unavailable,
            _ => Self::Off,
        }
    }
}

impl PlaybackStatus {
    /// Whether the card should switch to its unavailable display mode.
    pub fn suppresses_display(self) -> bool {
        matches!(self, Self::Unavailable | Self::Idle)
    }
}

/// Repeat mode, cycled `Off -> All -> One -> Off`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// No repetition
    #[default]
    Off,

    /// Repeat the whole queue
    All,

    /// Repeat the current track
    One,
}

impl From<&str> for RepeatMode {
    fn from(mode: &str) -> Self {
        match mode {
            "all" => Self::All,
            "one" => Self::One,
            _ => Self::Off,
        }
    }
}

impl RepeatMode {
    /// Next mode in the toggle cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }

    /// Host wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::One => "one",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const RADIO_MARKERS: [&str; 5] = [
    "x-rincon-mp3radio",
    "x-sonosapi-stream",
    "x-sonosapi-radio",
    "x-sonosapi-hls",
    "aac:",
];
const SPOTIFY_MARKER: &str = "x-sonos-spotify";
const HTTP_MARKER: &str = "x-sonos-http";

/// Kind of content being played, derived from the content id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentSource {
    /// Internet radio stream
    Radio,

    /// Spotify
    Spotify,

    /// Generic Sonos HTTP source (Plex and similar)
    Plex,

    /// Anything else
    #[default]
    Other,
}

impl ContentSource {
    /// Classify a content id. Radio markers win over Spotify, which wins
    /// over the generic HTTP marker.
    pub fn from_content_id(content_id: Option<&str>) -> Self {
        let Some(id) = content_id else {
            return Self::Other;
        };

        if RADIO_MARKERS.iter().any(|marker| id.contains(marker)) {
            Self::Radio
        } else if id.contains(SPOTIFY_MARKER) {
            Self::Spotify
        } else if id.contains(HTTP_MARKER) {
            Self::Plex
        } else {
            Self::Other
        }
    }

    /// Source icon, if the source has one.
    pub fn icon(self) -> Option<&'static str> {
        match self {
            Self::Radio => Some("mdi:radio"),
            Self::Spotify => Some("mdi:spotify"),
            Self::Plex => Some("mdi:plex"),
            Self::Other => None,
        }
    }
}

/// Normalized snapshot of a media player entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerState {
    /// Playback status
    pub status: PlaybackStatus,
    /// Reported position in seconds
    pub position: Option<f64>,
    /// Track duration in seconds
    pub duration: Option<f64>,
    /// Track title
    pub title: Option<String>,
    /// Track artist
    pub artist: Option<String>,
    /// Album name
    pub album: Option<String>,
    /// Content id used for source classification
    pub content_id: Option<String>,
    /// Whether the player is muted
    pub is_muted: bool,
    /// Volume in `[0, 1]`
    pub volume_level: f64,
    /// Shuffle flag
    pub shuffle: bool,
    /// Repeat mode
    pub repeat: RepeatMode,
    /// 1-based queue cursor
    pub queue_position: Option<u32>,
    /// Display name
    pub friendly_name: Option<String>,
}

impl PlayerState {
    /// Normalize a raw host state.
    pub fn from_entity(entity: &EntityState) -> Self {
        let text = |key: &str| {
            entity
                .attribute(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let flag = |key: &str| entity.attribute(key).and_then(Value::as_bool).unwrap_or(false);

        Self {
            status: PlaybackStatus::from(entity.state.as_str()),
            position: entity.attribute("media_position").and_then(seconds),
            duration: entity.attribute("media_duration").and_then(seconds),
            title: text("media_title"),
            artist: text("media_artist"),
            album: text("media_album_name"),
            content_id: text("media_content_id"),
            is_muted: flag("is_volume_muted"),
            volume_level: entity
                .attribute("volume_level")
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite())
                .map_or(0.0, |v| v.clamp(0.0, 1.0)),
            shuffle: flag("shuffle"),
            repeat: entity
                .attribute("repeat")
                .and_then(Value::as_str)
                .map(RepeatMode::from)
                .unwrap_or_default(),
            queue_position: entity.attribute("queue_position").and_then(queue_cursor),
            friendly_name: text("friendly_name"),
        }
    }

    /// Whether the player is playing.
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Title or the "Unknown" fallback.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN)
    }

    /// Artist or the "Unknown" fallback.
    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or(UNKNOWN)
    }

    /// Album or the "Unknown" fallback.
    pub fn display_album(&self) -> &str {
        self.album.as_deref().unwrap_or(UNKNOWN)
    }

    /// Content source classification.
    pub fn source(&self) -> ContentSource {
        ContentSource::from_content_id(self.content_id.as_deref())
    }
}

/// Parse a non-negative finite number of seconds from a number or numeric string.
fn seconds(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|s| s.is_finite() && *s >= 0.0)
}

/// Parse a 1-based queue cursor. Integral floats such as `3.0` are accepted.
fn queue_cursor(value: &Value) -> Option<u32> {
    let cursor = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u64)
    })?;
    u32::try_from(cursor).ok().filter(|p| *p > 0)
}

/// One entry in the playback queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    /// Track title
    pub title: String,
    /// Track artist
    pub artist: String,
    /// Album name
    pub album: String,
    /// Media uri
    pub uri: String,
    /// Duration in seconds, if known
    pub duration: Option<f64>,
}

impl QueueItem {
    fn from_value(value: &Value) -> Self {
        let text = |key: &str, fallback: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };

        Self {
            title: text("title", "Unknown Title"),
            artist: text("artist", "Unknown Artist"),
            album: text("album", "Unknown Album"),
            uri: text("uri", ""),
            duration: value.get("duration").and_then(seconds),
        }
    }
}

/// Ordered queue, indexed from 0
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueSnapshot {
    /// Queue entries
    pub items: Vec<QueueItem>,
}

impl QueueSnapshot {
    /// Entity where the queue helper publishes the queue for `player`.
    pub fn sensor_for(player: &EntityId) -> EntityId {
        EntityId::new(format!("sensor.{}_queue", player.object_id()))
    }

    /// Normalize a queue sensor state. Returns `None` when the sensor
    /// carries no item list.
    pub fn from_entity(entity: &EntityState) -> Option<Self> {
        let items = entity.attribute("items")?.as_array()?;
        Some(Self {
            items: items.iter().map(QueueItem::from_value).collect(),
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Translate a 1-based queue cursor to a 0-based index.
pub fn cursor_index(queue_position: u32) -> Option<usize> {
    queue_position
        .checked_sub(1)
        .and_then(|index| usize::try_from(index).ok())
}
