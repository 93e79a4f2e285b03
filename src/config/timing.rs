use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{CardError, Result};

/// Timer durations in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Extrapolation tick while playing.
    pub tick_ms: u64,

    /// Quiet period before a dragged seek is sent.
    pub seek_debounce_ms: u64,

    /// Delay before re-reading state after a seek settles.
    pub seek_refresh_ms: u64,

    /// Delay before re-reading state after play/pause settles.
    pub pause_refresh_ms: u64,

    /// Delay between queue fetch and reading the queue sensor.
    pub queue_fetch_delay_ms: u64,

    /// Delay before re-reading state after a queue jump.
    pub queue_refresh_ms: u64,

    /// How long a transient notice stays visible.
    pub notice_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            seek_debounce_ms: 250,
            seek_refresh_ms: 2000,
            pause_refresh_ms: 500,
            queue_fetch_delay_ms: 500,
            queue_refresh_ms: 500,
            notice_ms: 3000,
        }
    }
}

impl TimingConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        let fields = [
            ("tick_ms", self.tick_ms),
            ("seek_debounce_ms", self.seek_debounce_ms),
            ("seek_refresh_ms", self.seek_refresh_ms),
            ("pause_refresh_ms", self.pause_refresh_ms),
            ("queue_fetch_delay_ms", self.queue_fetch_delay_ms),
            ("queue_refresh_ms", self.queue_refresh_ms),
            ("notice_ms", self.notice_ms),
        ];

        match fields.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(CardError::InvalidConfig {
                field: format!("timing.{field}"),
                reason: "must be greater than zero".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Extrapolation tick.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Seek debounce window.
    pub fn seek_debounce(&self) -> Duration {
        Duration::from_millis(self.seek_debounce_ms)
    }

    /// Post-seek refresh delay.
    pub fn seek_refresh(&self) -> Duration {
        Duration::from_millis(self.seek_refresh_ms)
    }

    /// Post play/pause refresh delay.
    pub fn pause_refresh(&self) -> Duration {
        Duration::from_millis(self.pause_refresh_ms)
    }

    /// Queue sensor read delay.
    pub fn queue_fetch_delay(&self) -> Duration {
        Duration::from_millis(self.queue_fetch_delay_ms)
    }

    /// Post queue-jump refresh delay.
    pub fn queue_refresh(&self) -> Duration {
        Duration::from_millis(self.queue_refresh_ms)
    }

    /// Notice lifetime.
    pub fn notice(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }
}
