use tracing::{debug, warn};

use crate::services::hass::EntityId;
use crate::services::media_player::{CommandError, PlayerCommand, PlayerCommands};

/// Direction of relative queue moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Issue `next`
    Forward,
    /// Issue `previous`
    Backward,
}

impl Direction {
    fn command(self) -> PlayerCommand {
        match self {
            Self::Forward => PlayerCommand::NextTrack,
            Self::Backward => PlayerCommand::PreviousTrack,
        }
    }
}

/// Relative moves needed to reach a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePlan {
    /// Move direction, `None` when already on the entry
    pub direction: Option<Direction>,
    /// Number of moves
    pub steps: u64,
}

impl QueuePlan {
    /// Plan the moves from the 1-based `queue_position` to the 0-based
    /// `desired_index`. A missing cursor counts as position 0.
    pub fn between(desired_index: usize, queue_position: Option<u32>) -> Self {
        let desired = i64::try_from(desired_index).unwrap_or(i64::MAX - 1) + 1;
        let delta = desired - i64::from(queue_position.unwrap_or(0));

        let direction = match delta {
            d if d > 0 => Some(Direction::Forward),
            d if d < 0 => Some(Direction::Backward),
            _ => None,
        };

        Self {
            direction,
            steps: delta.unsigned_abs(),
        }
    }

    /// Every command to issue, in order, ending with `play`.
    pub fn commands(&self) -> impl Iterator<Item = PlayerCommand> + use<> {
        let step = self.direction.map(Direction::command);
        let count = if step.is_some() { self.steps } else { 0 };
        (0..count)
            .filter_map(move |_| step)
            .chain(std::iter::once(PlayerCommand::Play))
    }
}

/// A queue jump that stopped part way.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationError {
    /// Commands that settled before the failure
    pub completed: u64,
    /// The failure
    pub source: CommandError,
}

/// Resolves "play entry N" into sequential relative moves.
///
/// Each move is awaited before the next is sent because the host holds
/// a single stateful cursor.
#[derive(Clone)]
pub struct QueueNavigator {
    commands: PlayerCommands,
}

impl QueueNavigator {
    /// Navigator issuing through `commands`.
    pub fn new(commands: PlayerCommands) -> Self {
        Self { commands }
    }

    /// Move the cursor of `target` to `desired_index` and start playback.
    ///
    /// # Errors
    ///
    /// Returns the first failing step. Remaining steps are not issued and
    /// the cursor stays wherever the host left it.
    pub async fn play_index(
        &self,
        target: &EntityId,
        desired_index: usize,
        queue_position: Option<u32>,
    ) -> Result<QueuePlan, NavigationError> {
        let plan = QueuePlan::between(desired_index, queue_position);
        debug!(%target, desired_index, ?queue_position, ?plan, "queue jump");

        let mut completed = 0;
        for command in plan.commands() {
            if let Err(source) = self.commands.send(target, command).await {
                warn!(%target, completed, "queue jump aborted");
                return Err(NavigationError { completed, source });
            }
            completed += 1;
        }
        Ok(plan)
    }
}
