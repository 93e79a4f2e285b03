//! Player card core: one instance per configured player.
//!
//! The card mirrors authoritative pushes, extrapolates playback position
//! between them and turns user gestures into remote commands. All mutable
//! state lives in one [`CardState`] behind a lock that is never held
//! across a host call.

/// Local playback position estimate
pub mod estimator;
/// Transient and persistent notices
pub mod notice;
/// Queue navigation
pub mod queue;
/// Seek debouncing
pub mod seek;
/// Observable view model
pub mod view;
/// Mute volume memory
pub mod volume;

use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, trace, warn};

pub use estimator::{PositionEstimator, Progress, format_time, progress_fraction};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use queue::{Direction, NavigationError, QueueNavigator, QueuePlan};
pub use seek::{PendingSeek, SeekDebouncer};
pub use view::{CardView, QueuePopup, QueueRow};
pub use volume::{DEFAULT_RESTORE_LEVEL, MuteToggle, VolumeMemory};

use crate::Result;
use crate::config::{CardConfig, TimingConfig};
use crate::services::common::{TaskHandle, task::cancel_slot};
use crate::services::hass::{EntityId, Hass};
use crate::services::media_player::{
    AvailabilityChange, CommandError, PlayerCommand, PlayerCommands, PlayerState, PlayerView,
    QueueSnapshot, StateMirror,
};

const SEEK_FAILED: &str = "Unable to set the new position";
const QUEUE_FETCH_FAILED: &str = "Unable to fetch the playback queue";
const QUEUE_PLAY_FAILED: &str = "Unable to play the selected track";
const QUEUE_MISSING: &str = "Queue information not available";
const DURATION_MISSING: &str = "Media duration not available";
const REFRESH_FAILED: &str = "Unable to refresh the player state";

/// Per-instance mutable state.
struct CardState {
    mirror: StateMirror,
    estimator: PositionEstimator,
    seek: SeekDebouncer,
    volume: VolumeMemory,
    notices: NoticeBoard,
    ticker: Option<TaskHandle>,
    refresh: Option<TaskHandle>,
    player: Option<EntityId>,
    last: Option<PlayerState>,
    torn_down: bool,
}

struct CardInner {
    hass: Arc<dyn Hass>,
    commands: PlayerCommands,
    navigator: QueueNavigator,
    configured: EntityId,
    timing: TimingConfig,
    view: CardView,
    state: Mutex<CardState>,
}

/// A media player card bound to one configured entity.
///
/// Cloning is cheap and every clone drives the same instance.
#[derive(Clone)]
pub struct PlayerCard {
    inner: Arc<CardInner>,
}

impl PlayerCard {
    /// Set up a card. Call [`PlayerCard::handle_push`] to render the first state.
    ///
    /// # Errors
    ///
    /// Returns `CardError::MissingEntity` or `CardError::InvalidConfig`
    /// when the configuration is unusable.
    pub fn new(hass: Arc<dyn Hass>, config: &CardConfig) -> Result<Self> {
        let entity = config
            .validate()
            .inspect_err(|err| error!(error = %err, "invalid card configuration"))?;
        let configured = EntityId::new(entity);
        let commands = PlayerCommands::new(Arc::clone(&hass));
        let view = CardView::new(config.header().map(str::to_string));
        let notices = NoticeBoard::new(view.notice.clone());

        info!(entity = %configured, "player card configured");

        Ok(Self {
            inner: Arc::new(CardInner {
                hass,
                navigator: QueueNavigator::new(commands.clone()),
                commands,
                configured,
                timing: config.timing.clone(),
                view,
                state: Mutex::new(CardState {
                    mirror: StateMirror::new(),
                    estimator: PositionEstimator::new(Instant::now()),
                    seek: SeekDebouncer::new(),
                    volume: VolumeMemory::new(),
                    notices,
                    ticker: None,
                    refresh: None,
                    player: None,
                    last: None,
                    torn_down: false,
                }),
            }),
        })
    }

    /// Observable view model.
    pub fn view(&self) -> &CardView {
        &self.inner.view
    }

    /// Configured entity.
    pub fn entity(&self) -> &EntityId {
        &self.inner.configured
    }

    /// Media player currently targeted, if resolved.
    pub async fn player(&self) -> Option<EntityId> {
        self.inner.state.lock().await.player.clone()
    }

    /// Estimated position right now.
    pub async fn estimated_position(&self) -> f64 {
        let state = self.inner.state.lock().await;
        state.estimator.position_at(Instant::now())
    }

    /// Progress computed right now, independent of the tick.
    pub async fn progress(&self) -> Progress {
        let state = self.inner.state.lock().await;
        state.estimator.progress(Instant::now())
    }

    /// Whether the position is being extrapolated.
    pub async fn is_extrapolating(&self) -> bool {
        self.inner.state.lock().await.estimator.is_extrapolating()
    }

    /// Level that the next unmute will restore, if remembered.
    pub async fn remembered_volume(&self) -> Option<f64> {
        self.inner.state.lock().await.volume.previous()
    }

    /// Apply the host's current snapshot. Call on every authoritative push.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn handle_push(&self) {
        let mut state = self.inner.state.lock().await;
        if state.torn_down {
            return;
        }
        let now = Instant::now();

        let player = self.resolve_player();
        let snapshot = player
            .as_ref()
            .and_then(|id| self.inner.hass.state(id))
            .map(|raw| PlayerState::from_entity(&raw));
        let fallback = player
            .as_ref()
            .unwrap_or(&self.inner.configured)
            .to_string();

        let (view, change) = state.mirror.apply(snapshot.as_ref(), &fallback);
        debug!(?change, status = ?snapshot.as_ref().map(|s| s.status), "push");

        match (&view, snapshot.as_ref()) {
            (PlayerView::Available(_), Some(snapshot)) => {
                if change == AvailabilityChange::Regained {
                    state.notices.clear_persistent();
                }
                let was_muted = state.last.as_ref().is_some_and(|s| s.is_muted);
                if was_muted && !snapshot.is_muted {
                    state.volume.forget();
                }
                state.estimator.observe(snapshot, now);
            }
            (PlayerView::Unavailable { name }, _) => {
                state.estimator.reset(now);
                state.seek.cancel();
                state.notices.persistent(format!("Player {name} unavailable"));
            }
            _ => {}
        }

        state.player = player;
        state.last = snapshot;
        self.sync_ticker(&mut state);
        self.publish_progress(&state, now);
        self.inner.view.player.set(view);

        let queue_position = state.last.as_ref().and_then(|s| s.queue_position);
        self.inner.view.queue.update(|popup| popup.visible && popup.mark_current(queue_position));
    }

    /// Toggle between play and pause.
    ///
    /// Pausing freezes the displayed position immediately, then re-seeks
    /// the player to the frozen position once the pause settles. A state
    /// refresh is scheduled either way.
    ///
    /// # Errors
    ///
    /// Returns the failed command; a notice has already been shown.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn play_pause(&self) -> std::result::Result<(), CommandError> {
        let (target, was_playing, frozen) = {
            let mut state = self.inner.state.lock().await;
            let target = self.target(&state)?;
            let now = Instant::now();
            let was_playing = state.last.as_ref().is_some_and(PlayerState::is_playing);
            if was_playing {
                state.estimator.stop(now);
                self.sync_ticker(&mut state);
                self.publish_progress(&state, now);
            }
            (target, was_playing, state.estimator.position_at(now))
        };

        let command = if was_playing {
            PlayerCommand::Pause
        } else {
            PlayerCommand::Play
        };
        let result = self.inner.commands.send(&target, command).await;

        let result = match result {
            Ok(()) if was_playing => self.resync_position(&target, frozen).await,
            other => other,
        };

        let mut state = self.inner.state.lock().await;
        if let Err(err) = &result {
            state.notices.transient(
                format!("Unable to {}: {err}", err.command().unwrap_or(command.service())),
                self.inner.timing.notice(),
            );
        }
        self.schedule_refresh(&mut state, self.inner.timing.pause_refresh());
        result
    }

    /// Skip to the next track.
    ///
    /// # Errors
    ///
    /// Returns the failed command; a notice has already been shown.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn next_track(&self) -> std::result::Result<(), CommandError> {
        self.send(PlayerCommand::NextTrack).await
    }

    /// Go to the previous track.
    ///
    /// # Errors
    ///
    /// Returns the failed command; a notice has already been shown.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn previous_track(&self) -> std::result::Result<(), CommandError> {
        self.send(PlayerCommand::PreviousTrack).await
    }

    /// Handle one input event from the progress slider (0 to 100).
    ///
    /// The bar moves immediately. The seek is sent once no further input
    /// arrives within the debounce window; earlier targets are dropped.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn seek_input(&self, ui_value: f64) {
        let mut state = self.inner.state.lock().await;
        let fraction = seek::slider_fraction(ui_value);
        self.inner.view.progress.update(|progress| {
            let changed = progress.fraction != fraction;
            progress.fraction = fraction;
            changed
        });

        if state.player.is_none() {
            return;
        }
        let Some(duration) = state.last.as_ref().and_then(|s| s.duration).filter(|d| *d > 0.0)
        else {
            warn!(entity = %self.inner.configured, "seek without a media duration");
            state
                .notices
                .transient(DURATION_MISSING, self.inner.timing.notice());
            return;
        };

        let position = seek::target_position(fraction, duration);
        let debounce = self.inner.timing.seek_debounce();
        let weak = self.downgrade();
        let generation = state.seek.arm(fraction, position, Instant::now() + debounce, |generation| {
            TaskHandle::spawn(async move {
                tokio::time::sleep(debounce).await;
                if let Some(card) = Self::upgrade(&weak) {
                    card.fire_seek(generation).await;
                }
            })
        });
        trace!(position, generation, "seek armed");
    }

    async fn fire_seek(&self, generation: u64) {
        let (target, position) = {
            let mut state = self.inner.state.lock().await;
            let Some(position) = state.seek.fire(generation) else {
                return;
            };
            let Some(target) = state.player.clone() else {
                state.seek.settle(generation);
                return;
            };
            self.inner.view.seeking.set(true);
            self.inner.view.progress.update(|progress| {
                progress.current = format_time(position);
                true
            });
            (target, position)
        };

        let result = self.inner.commands.send(&target, PlayerCommand::Seek(position)).await;

        let mut state = self.inner.state.lock().await;
        let latest = state.seek.settle(generation);
        self.inner.view.seeking.set(state.seek.is_seeking());
        if state.torn_down {
            return;
        }
        let now = Instant::now();
        match result {
            Ok(()) if latest => {
                state.estimator.adopt(position, now);
                self.publish_progress(&state, now);
            }
            Ok(()) => trace!(position, generation, "superseded seek settled"),
            Err(_) => state.notices.transient(SEEK_FAILED, self.inner.timing.notice()),
        }
        self.schedule_refresh(&mut state, self.inner.timing.seek_refresh());
    }

    /// Handle one input event from the volume slider (0 to 100).
    ///
    /// # Errors
    ///
    /// Returns the failed command; a notice has already been shown.
    pub async fn set_volume(&self, ui_value: f64) -> std::result::Result<(), CommandError> {
        self.send(PlayerCommand::SetVolume(volume::slider_level(ui_value)))
            .await
    }

    /// Mute, or restore the remembered level and unmute.
    ///
    /// Both unmute commands are issued together, volume first, without
    /// waiting for either to confirm.
    ///
    /// # Errors
    ///
    /// Returns the first failed command; a notice has already been shown.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn toggle_mute(&self) -> std::result::Result<(), CommandError> {
        let (target, toggle) = {
            let mut state = self.inner.state.lock().await;
            let target = self.target(&state)?;
            let (muted, level) = state
                .last
                .as_ref()
                .map_or((false, 0.0), |s| (s.is_muted, s.volume_level));
            (target, state.volume.toggle(muted, level))
        };

        let result = match toggle {
            MuteToggle::Unmute { restore } => {
                let (volume, unmute) = future::join(
                    self.inner.commands.send(&target, PlayerCommand::SetVolume(restore)),
                    self.inner.commands.send(&target, PlayerCommand::SetMute(false)),
                )
                .await;
                volume.and(unmute)
            }
            MuteToggle::Mute => self.inner.commands.send(&target, PlayerCommand::SetMute(true)).await,
        };

        if let Err(err) = &result {
            let mut state = self.inner.state.lock().await;
            match toggle {
                MuteToggle::Mute => state.volume.forget(),
                MuteToggle::Unmute { restore } => state.volume.restore(restore),
            }
            state
                .notices
                .transient(format!("Unable to change mute: {err}"), self.inner.timing.notice());
        }
        result
    }

    /// Flip shuffle.
    ///
    /// # Errors
    ///
    /// Returns the failed command; a notice has already been shown.
    pub async fn toggle_shuffle(&self) -> std::result::Result<(), CommandError> {
        let shuffle = self.last_state().await.is_some_and(|s| s.shuffle);
        self.send(PlayerCommand::SetShuffle(!shuffle)).await
    }

    /// Advance repeat `off -> all -> one -> off`.
    ///
    /// # Errors
    ///
    /// Returns the failed command; a notice has already been shown.
    pub async fn cycle_repeat(&self) -> std::result::Result<(), CommandError> {
        let repeat = self.last_state().await.map(|s| s.repeat).unwrap_or_default();
        self.send(PlayerCommand::SetRepeat(repeat.next())).await
    }

    /// Flip the targeted entity as a boolean.
    ///
    /// # Errors
    ///
    /// Returns the failed command; a notice has already been shown.
    pub async fn toggle(&self) -> std::result::Result<(), CommandError> {
        self.send(PlayerCommand::Toggle).await
    }

    /// Fetch the queue and open the popup.
    ///
    /// # Errors
    ///
    /// Returns the failed fetch; a notice has already been shown.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn open_queue(&self) -> std::result::Result<(), CommandError> {
        let target = {
            let state = self.inner.state.lock().await;
            self.target(&state)?
        };

        if let Err(err) = self.inner.commands.send(&target, PlayerCommand::FetchQueue).await {
            let mut state = self.inner.state.lock().await;
            state
                .notices
                .transient(QUEUE_FETCH_FAILED, self.inner.timing.notice());
            return Err(err);
        }

        tokio::time::sleep(self.inner.timing.queue_fetch_delay()).await;

        let mut state = self.inner.state.lock().await;
        let queue = self
            .inner
            .hass
            .state(&QueueSnapshot::sensor_for(&target))
            .and_then(|raw| QueueSnapshot::from_entity(&raw));
        let queue_position = state.last.as_ref().and_then(|s| s.queue_position);
        let name = state
            .last
            .as_ref()
            .and_then(|s| s.friendly_name.clone())
            .unwrap_or_else(|| target.to_string());

        let rows = match queue {
            Some(queue) => QueuePopup::rows_for(&queue, queue_position),
            None => {
                warn!(%target, "queue sensor has no items");
                state.notices.transient(QUEUE_MISSING, self.inner.timing.notice());
                vec![QueueRow::Placeholder(QUEUE_MISSING.to_string())]
            }
        };
        debug!(%target, rows = rows.len(), "queue popup opened");

        self.inner.view.queue.set(QueuePopup {
            visible: true,
            title: format!("Queue of {name}"),
            rows,
        });
        Ok(())
    }

    /// Close the queue popup.
    pub fn close_queue(&self) {
        self.inner.view.queue.update(|popup| {
            let was_visible = popup.visible;
            popup.visible = false;
            was_visible
        });
    }

    /// Jump to queue entry `index` (0-based) and start playback.
    ///
    /// # Errors
    ///
    /// Returns the step that failed; a notice has already been shown.
    #[instrument(skip(self), fields(entity = %self.inner.configured))]
    pub async fn play_queue_item(&self, index: usize) -> std::result::Result<QueuePlan, NavigationError> {
        let (target, queue_position) = {
            let state = self.inner.state.lock().await;
            let target = self.target(&state).map_err(|source| NavigationError {
                completed: 0,
                source,
            })?;
            (target, state.last.as_ref().and_then(|s| s.queue_position))
        };

        let result = self
            .inner
            .navigator
            .play_index(&target, index, queue_position)
            .await;

        let mut state = self.inner.state.lock().await;
        match &result {
            Ok(plan) => {
                info!(%target, index, steps = plan.steps, "queue jump complete");
                self.close_queue();
                self.schedule_refresh(&mut state, self.inner.timing.queue_refresh());
            }
            Err(_) => state
                .notices
                .transient(QUEUE_PLAY_FAILED, self.inner.timing.notice()),
        }
        result
    }

    /// Ask the host to poll the player now and re-render.
    ///
    /// # Errors
    ///
    /// Returns the failed refresh; a notice has already been shown.
    pub async fn force_update(&self) -> std::result::Result<(), CommandError> {
        self.send(PlayerCommand::Refresh).await?;
        self.handle_push().await;
        Ok(())
    }

    /// Stop every timer. Later pushes are ignored.
    pub async fn teardown(&self) {
        let mut state = self.inner.state.lock().await;
        state.torn_down = true;
        state.estimator.stop(Instant::now());
        state.seek.cancel();
        cancel_slot(&mut state.ticker);
        cancel_slot(&mut state.refresh);
        state.notices.clear();
        debug!(entity = %self.inner.configured, "player card torn down");
    }

    async fn send(&self, command: PlayerCommand) -> std::result::Result<(), CommandError> {
        let target = {
            let state = self.inner.state.lock().await;
            self.target(&state)?
        };

        let result = self.inner.commands.send(&target, command).await;
        if let Err(err) = &result {
            let mut state = self.inner.state.lock().await;
            state.notices.transient(
                format!("Unable to {}: {err}", command.service()),
                self.inner.timing.notice(),
            );
        }
        result
    }

    /// Seek to the frozen pause position, then adopt what the host reports.
    async fn resync_position(&self, target: &EntityId, frozen: f64) -> std::result::Result<(), CommandError> {
        let position = seek::target_position(1.0, frozen);
        self.inner.commands.send(target, PlayerCommand::Seek(position)).await?;
        self.inner.commands.send(target, PlayerCommand::Refresh).await?;

        let reported = self
            .inner
            .hass
            .state(target)
            .map(|raw| PlayerState::from_entity(&raw))
            .and_then(|s| s.position);
        if let Some(reported) = reported {
            let mut state = self.inner.state.lock().await;
            let now = Instant::now();
            state.estimator.adopt(reported, now);
            self.publish_progress(&state, now);
            debug!(%target, reported, "position synced after pause");
        }
        Ok(())
    }

    async fn last_state(&self) -> Option<PlayerState> {
        self.inner.state.lock().await.last.clone()
    }

    fn target(&self, state: &CardState) -> std::result::Result<EntityId, CommandError> {
        match (&state.player, state.mirror.is_available()) {
            (Some(player), true) => Ok(player.clone()),
            (player, _) => Err(CommandError::Unavailable(
                player.clone().unwrap_or_else(|| self.inner.configured.clone()),
            )),
        }
    }

    /// The configured entity if it is a media player, otherwise the
    /// entity named by the configured helper's state.
    fn resolve_player(&self) -> Option<EntityId> {
        let configured = &self.inner.configured;
        if configured.domain() == "media_player" {
            return Some(configured.clone());
        }

        let helper = self.inner.hass.state(configured)?;
        let named = helper.state.trim();
        (!named.is_empty() && named.contains('.')).then(|| EntityId::new(named))
    }

    fn publish_progress(&self, state: &CardState, now: Instant) {
        if state.seek.is_busy() {
            return;
        }
        self.inner.view.progress.set(state.estimator.progress(now));
    }

    /// Run the ticker exactly while the estimator extrapolates.
    fn sync_ticker(&self, state: &mut CardState) {
        if !state.estimator.is_extrapolating() {
            cancel_slot(&mut state.ticker);
            return;
        }
        if state.ticker.as_ref().is_some_and(TaskHandle::is_active) {
            return;
        }

        let weak = self.downgrade();
        let tick = self.inner.timing.tick();
        state.ticker = Some(TaskHandle::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Some(card) = Self::upgrade(&weak) else {
                    break;
                };
                if !card.on_tick().await {
                    break;
                }
            }
        }));
    }

    async fn on_tick(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        let now = Instant::now();
        let running = state.estimator.tick(now);
        trace!(position = state.estimator.position_at(now), "tick");
        self.publish_progress(&state, now);
        if !running {
            debug!(entity = %self.inner.configured, "reached end of track");
            if let Some(ticker) = state.ticker.take() {
                ticker.detach();
            }
        }
        running
    }

    /// Replace the pending deferred refresh.
    fn schedule_refresh(&self, state: &mut CardState, delay: Duration) {
        if state.torn_down {
            return;
        }
        let weak = self.downgrade();
        let target = state.player.clone();

        cancel_slot(&mut state.refresh);
        state.refresh = Some(TaskHandle::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(card) = Self::upgrade(&weak) else {
                return;
            };
            if let Some(target) = target {
                if card.inner.commands.send(&target, PlayerCommand::Refresh).await.is_err() {
                    let mut state = card.inner.state.lock().await;
                    state
                        .notices
                        .transient(REFRESH_FAILED, card.inner.timing.notice());
                }
            }
            card.handle_push().await;
        }));
    }

    fn downgrade(&self) -> Weak<CardInner> {
        Arc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<CardInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }
}
