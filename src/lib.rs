//! Sonos player card - reconciliation core for a media player dashboard card.
//!
//! The card mirrors the authoritative state pushed by a home automation host
//! and keeps the display responsive between pushes:
//!
//! - Normalized now-playing view with an unavailable mode
//! - Local playback position estimate between pushes
//! - Debounced seeking, mute with volume memory, play/pause resync
//! - Queue popup with jump-to-entry via relative moves
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sonos_card::{PlayerCard, config::CardConfig, services::MemoryHass};
//!
//! # async fn run() -> sonos_card::Result<()> {
//! let hass = Arc::new(MemoryHass::new());
//! let card = PlayerCard::new(hass, &CardConfig::for_entity("media_player.kitchen"))?;
//!
//! card.handle_push().await;
//! println!("{:?}", card.view().player.get());
//! # Ok(())
//! # }
//! ```

/// Card configuration schema, validation and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Card type registration.
pub mod registry;

/// Host seam, media player model and the card itself.
pub mod services;

/// Logging setup for binaries embedding the card.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{CardError, Result};
pub use registry::{CARD_TYPE, CardCatalog, CardInfo};
pub use services::PlayerCard;
