use tokio::time::Instant;

use crate::services::common::{TaskHandle, task::cancel_slot};

/// Map a 0-100 slider value to a progress fraction.
pub fn slider_fraction(ui_value: f64) -> f64 {
    if ui_value.is_finite() {
        (ui_value / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Seek target in seconds for `fraction` of `duration`, rounded to
/// two decimal places.
pub fn target_position(fraction: f64, duration: f64) -> f64 {
    (fraction * duration * 100.0).round() / 100.0
}

/// A dragged seek waiting for its debounce deadline.
#[derive(Debug)]
pub struct PendingSeek {
    /// Requested fraction of the track
    pub target_fraction: f64,
    /// Requested position in seconds
    pub target_position: f64,
    /// When the seek will be issued
    pub deadline: Instant,
    generation: u64,
    timer: Option<TaskHandle>,
}

/// Holds at most one pending seek. A newer gesture supersedes the
/// pending one; only the last target before the deadline is sent.
///
/// Seeks already sent may overlap. Only the most recent gesture may
/// settle the displayed position.
#[derive(Debug, Default)]
pub struct SeekDebouncer {
    pending: Option<PendingSeek>,
    generation: u64,
    in_flight: usize,
}

impl SeekDebouncer {
    /// Empty debouncer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any pending seek with a new target. `timer` receives the
    /// generation to pass back to [`SeekDebouncer::fire`].
    pub fn arm(
        &mut self,
        target_fraction: f64,
        target_position: f64,
        deadline: Instant,
        timer: impl FnOnce(u64) -> TaskHandle,
    ) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;

        self.pending = Some(PendingSeek {
            target_fraction,
            target_position,
            deadline,
            generation,
            timer: Some(timer(generation)),
        });
        generation
    }

    /// Claim the pending seek when its timer fires. Returns the target
    /// position if `generation` is still the live one.
    pub fn fire(&mut self, generation: u64) -> Option<f64> {
        if self.pending.as_ref()?.generation != generation {
            return None;
        }
        let mut pending = self.pending.take()?;
        if let Some(timer) = pending.timer.take() {
            timer.detach();
        }
        self.in_flight += 1;
        Some(pending.target_position)
    }

    /// Mark the seek fired as `generation` as settled. Returns whether it
    /// is still the latest gesture.
    pub fn settle(&mut self, generation: u64) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        generation == self.generation
    }

    /// Drop the pending seek and stop its timer.
    pub fn cancel(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            cancel_slot(&mut pending.timer);
        }
    }

    /// The pending seek, if any.
    pub fn pending(&self) -> Option<&PendingSeek> {
        self.pending.as_ref()
    }

    /// Whether a seek is pending or being sent.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some() || self.in_flight > 0
    }

    /// Whether a seek command is being sent.
    pub fn is_seeking(&self) -> bool {
        self.in_flight > 0
    }
}
