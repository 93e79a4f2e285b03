use tokio::time::Instant;

use crate::services::media_player::{PlaybackStatus, PlayerState};

/// Progress of the current track as shown to the user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Progress {
    /// Estimated position in seconds
    pub position: f64,
    /// Track duration in seconds, if known
    pub duration: Option<f64>,
    /// `position / duration` in `[0, 1]`, 0 when the duration is unknown
    pub fraction: f64,
    /// Formatted position
    pub current: String,
    /// Formatted duration
    pub total: String,
}

impl Progress {
    /// Build from a position and optional duration.
    pub fn new(position: f64, duration: Option<f64>) -> Self {
        Self {
            position,
            duration,
            fraction: progress_fraction(position, duration),
            current: format_time(position),
            total: format_time(duration.unwrap_or(0.0)),
        }
    }
}

/// `position / duration`, clamped to `[0, 1]`. Zero for a missing,
/// zero or non-finite duration.
pub fn progress_fraction(position: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(duration) if duration.is_finite() && duration > 0.0 && position.is_finite() => {
            (position / duration).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

/// Format seconds as `m:ss`, flooring both parts.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Local playback position estimate between authoritative pushes.
///
/// The position is held as an anchor value plus the instant it was taken;
/// reads add the elapsed time since the anchor. While extrapolating the
/// estimate never exceeds the track duration: reaching it clamps the
/// anchor to the duration and stops extrapolation.
#[derive(Debug)]
pub struct PositionEstimator {
    last_known: f64,
    reference: Instant,
    extrapolating: bool,
    duration: Option<f64>,
    last_title: Option<String>,
    last_status: Option<PlaybackStatus>,
}

impl PositionEstimator {
    /// Idle estimator at position 0.
    pub fn new(now: Instant) -> Self {
        Self {
            last_known: 0.0,
            reference: now,
            extrapolating: false,
            duration: None,
            last_title: None,
            last_status: None,
        }
    }

    /// Apply an authoritative push.
    ///
    /// A playing push resets the anchor to the pushed position only when
    /// the title changed or the previous push was not playing; otherwise
    /// the local estimate is kept. A non-playing push stops extrapolation
    /// and adopts the pushed position when one is reported.
    pub fn observe(&mut self, state: &PlayerState, now: Instant) {
        self.duration = state.duration;

        if state.is_playing() {
            let title_changed = state.title != self.last_title;
            let was_playing = self.last_status == Some(PlaybackStatus::Playing);
            if title_changed || !was_playing {
                self.anchor(state.position.unwrap_or(0.0), now);
            }
            if !self.extrapolating {
                self.start(now);
            }
        } else {
            self.stop(now);
            if let Some(position) = state.position {
                self.anchor(position, now);
            }
        }

        self.last_title = state.title.clone();
        self.last_status = Some(state.status);
    }

    /// Advance the estimate to `now`. Returns whether extrapolation is
    /// still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.extrapolating {
            return false;
        }

        if let Some(duration) = self.duration {
            if self.unclamped_at(now) >= duration {
                self.last_known = duration;
                self.reference = now;
                self.extrapolating = false;
            }
        }
        self.extrapolating
    }

    /// Start extrapolating from the current anchor. Does nothing at the
    /// end of the track.
    pub fn start(&mut self, now: Instant) {
        self.reference = now;
        self.extrapolating = self.duration.is_none_or(|d| self.last_known < d);
    }

    /// Freeze the estimate at `now` and stop extrapolating.
    pub fn stop(&mut self, now: Instant) {
        if self.extrapolating {
            self.last_known = self.position_at(now);
            self.reference = now;
            self.extrapolating = false;
        }
    }

    /// Adopt a confirmed position, restarting the reference clock.
    pub fn adopt(&mut self, position: f64, now: Instant) {
        self.anchor(position, now);
        if self.extrapolating {
            self.start(now);
        }
    }

    /// Forget history so the next playing push re-seeds the estimate.
    pub fn reset(&mut self, now: Instant) {
        self.stop(now);
        self.last_title = None;
        self.last_status = None;
    }

    /// Estimated position at `now`.
    pub fn position_at(&self, now: Instant) -> f64 {
        if !self.extrapolating {
            return self.last_known;
        }
        let position = self.unclamped_at(now);
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Displayed progress at `now`.
    pub fn progress(&self, now: Instant) -> Progress {
        Progress::new(self.position_at(now), self.duration)
    }

    /// Whether the estimate is advancing with wall-clock time.
    pub fn is_extrapolating(&self) -> bool {
        self.extrapolating
    }

    fn unclamped_at(&self, now: Instant) -> f64 {
        self.last_known + now.saturating_duration_since(self.reference).as_secs_f64()
    }

    fn anchor(&mut self, position: f64, now: Instant) {
        let position = position.max(0.0);
        self.last_known = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.reference = now;
    }
}
