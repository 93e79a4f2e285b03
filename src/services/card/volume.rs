/// Level restored on unmute when nothing was remembered.
pub const DEFAULT_RESTORE_LEVEL: f64 = 0.5;

/// Map a 0-100 slider value to a volume level.
pub fn slider_level(ui_value: f64) -> f64 {
    if ui_value.is_finite() {
        (ui_value / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Commands needed to flip the mute state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MuteToggle {
    /// Restore `restore` then unmute
    Unmute {
        /// Level to restore
        restore: f64,
    },
    /// Mute, remembering the current level
    Mute,
}

/// Volume level remembered across a mute.
///
/// Holds a value only while the player is muted by this card.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VolumeMemory {
    previous: Option<f64>,
}

impl VolumeMemory {
    /// Empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan a mute toggle and update the memory accordingly.
    pub fn toggle(&mut self, is_muted: bool, current_level: f64) -> MuteToggle {
        if is_muted {
            MuteToggle::Unmute {
                restore: self.previous.take().unwrap_or(DEFAULT_RESTORE_LEVEL),
            }
        } else {
            self.previous = Some(current_level);
            MuteToggle::Mute
        }
    }

    /// Drop the remembered level after a failed mute, or once the
    /// player reports itself unmuted.
    pub fn forget(&mut self) {
        self.previous = None;
    }

    /// Put back a level taken by an unmute that did not go through.
    pub fn restore(&mut self, level: f64) {
        self.previous = Some(level);
    }

    /// Remembered level.
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }
}
