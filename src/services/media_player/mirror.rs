use super::{ContentSource, PlayerState, RepeatMode};

/// Display fields derived from an available player.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    /// Title, "Unknown" when absent
    pub title: String,
    /// Artist, "Unknown" when absent
    pub artist: String,
    /// Album, "Unknown" when absent
    pub album: String,
    /// Content source
    pub source: ContentSource,
    /// Playing flag
    pub playing: bool,
    /// Muted flag
    pub muted: bool,
    /// Volume slider position, 0 to 100
    pub volume_percent: f64,
    /// Shuffle flag
    pub shuffle: bool,
    /// Repeat mode
    pub repeat: RepeatMode,
    /// 1-based queue cursor
    pub queue_position: Option<u32>,
}

impl NowPlaying {
    /// Play/pause button icon.
    pub fn play_pause_icon(&self) -> &'static str {
        if self.playing { "mdi:pause" } else { "mdi:play" }
    }

    /// Volume button icon.
    pub fn volume_icon(&self) -> &'static str {
        if self.muted { "mdi:volume-off" } else { "mdi:volume-high" }
    }

    /// Shuffle button icon.
    pub fn shuffle_icon(&self) -> &'static str {
        if self.shuffle { "mdi:shuffle" } else { "mdi:shuffle-disabled" }
    }

    /// Repeat button icon.
    pub fn repeat_icon(&self) -> &'static str {
        match self.repeat {
            RepeatMode::Off => "mdi:repeat-off",
            RepeatMode::All => "mdi:repeat",
            RepeatMode::One => "mdi:repeat-once",
        }
    }

    /// Source badge icon.
    pub fn source_icon(&self) -> Option<&'static str> {
        self.source.icon()
    }
}

/// What the card renders for the target player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerView {
    /// Nothing pushed yet
    Loading,

    /// Player missing, idle or unavailable. All derived fields are suppressed.
    Unavailable {
        /// Name shown in the unavailable notice
        name: String,
    },

    /// Player available
    Available(NowPlaying),
}

impl PlayerView {
    /// Whether interactive controls are shown.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Availability transition caused by a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityChange {
    /// Player became unavailable
    Lost,
    /// Player became available
    Regained,
    /// No transition
    Unchanged,
}

/// Derives the view model from authoritative pushes and tracks
/// availability transitions between them.
#[derive(Debug, Default)]
pub struct StateMirror {
    available: Option<bool>,
}

impl StateMirror {
    /// Fresh mirror with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror a push. `fallback_name` names the player when the state is
    /// missing or has no friendly name.
    pub fn apply(
        &mut self,
        state: Option<&PlayerState>,
        fallback_name: &str,
    ) -> (PlayerView, AvailabilityChange) {
        let view = Self::view(state, fallback_name);
        let now_available = view.is_available();

        let change = match self.available.replace(now_available) {
            Some(true) if !now_available => AvailabilityChange::Lost,
            Some(false) | None if now_available => AvailabilityChange::Regained,
            None => AvailabilityChange::Lost,
            _ => AvailabilityChange::Unchanged,
        };

        (view, change)
    }

    /// Pure view derivation.
    pub fn view(state: Option<&PlayerState>, fallback_name: &str) -> PlayerView {
        match state {
            Some(state) if !state.status.suppresses_display() => {
                PlayerView::Available(NowPlaying {
                    title: state.display_title().to_string(),
                    artist: state.display_artist().to_string(),
                    album: state.display_album().to_string(),
                    source: state.source(),
                    playing: state.is_playing(),
                    muted: state.is_muted,
                    volume_percent: state.volume_level * 100.0,
                    shuffle: state.shuffle,
                    repeat: state.repeat,
                    queue_position: state.queue_position,
                })
            }
            Some(state) => PlayerView::Unavailable {
                name: state
                    .friendly_name
                    .clone()
                    .unwrap_or_else(|| fallback_name.to_string()),
            },
            None => PlayerView::Unavailable {
                name: fallback_name.to_string(),
            },
        }
    }

    /// Whether the last mirrored push was available.
    pub fn is_available(&self) -> bool {
        self.available.unwrap_or(false)
    }
}
