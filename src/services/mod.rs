/// Player card core
pub mod card;
/// Shared reactive and task primitives
pub mod common;
/// Home automation host seam
pub mod hass;
/// Media player model and commands
pub mod media_player;

pub use card::PlayerCard;
pub use hass::{EntityId, EntityState, Hass, HassError, MemoryHass};
pub use media_player::{PlayerCommand, PlayerState, PlayerView};
