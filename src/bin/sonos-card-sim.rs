//! Sonos card simulator - drives a player card against an in-memory host
//!
//! Seeds a playing Sonos speaker and its queue, runs a short scripted
//! session through the card and prints every service call it issued.

use std::{error::Error, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use serde_json::json;
use sonos_card::{
    CardCatalog, PlayerCard,
    config::{CardConfig, STUB_ENTITY},
    services::{EntityId, EntityState, MemoryHass, PlayerView},
    tracing_config,
};
use tracing::{Level, info, span};

const DEFAULT_PLAYER: &str = "media_player.living_room";

/// Scripted session against a simulated Sonos speaker
#[derive(Parser, Debug)]
#[command(name = "sonos-card-sim", version, about)]
struct Args {
    /// Card configuration file (TOML). The catalog stub is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured entity
    #[arg(short, long)]
    entity: Option<String>,

    /// Slider value (0-100) for the scripted seek
    #[arg(long, default_value_t = 50.0)]
    seek_to: f64,

    /// Queue entry (0-based) for the scripted jump
    #[arg(long, default_value_t = 0)]
    queue_index: usize,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.schema {
        println!("{}", serde_json::to_string_pretty(&CardConfig::json_schema())?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => CardConfig::load(path)?,
        None => CardConfig::stub(),
    };
    if let Some(entity) = &args.entity {
        config.entity = Some(entity.clone());
    }

    tracing_config::init(config.log_level)?;
    let _span = span!(Level::INFO, "sonos_card_sim").entered();

    let catalog = CardCatalog::with_player_card();
    for card in catalog.list() {
        info!(card_type = %card.card_type, name = %card.name, "registered card");
    }

    let hass = Arc::new(MemoryHass::with_echo());
    let player = seed(&hass, &config);
    let card = PlayerCard::new(hass.clone(), &config)?;
    info!(%player, "simulating");

    run_session(&card, &hass, &args).await;

    println!("\nservice calls:");
    for call in hass.calls() {
        println!("  {} {}", call.name(), call.data);
    }

    card.teardown().await;
    Ok(())
}

/// Seed the host with a playing speaker and its queue. A helper entity
/// that is not itself a media player is pointed at the seeded speaker.
fn seed(hass: &MemoryHass, config: &CardConfig) -> EntityId {
    let configured = EntityId::new(config.entity.as_deref().unwrap_or(STUB_ENTITY));
    let player = if configured.domain() == "media_player" {
        configured.clone()
    } else {
        hass.set_state(configured, EntityState::new(DEFAULT_PLAYER));
        EntityId::new(DEFAULT_PLAYER)
    };

    hass.set_state(
        player.clone(),
        EntityState::new("playing")
            .with_attribute("friendly_name", "Living Room")
            .with_attribute("media_title", "Teardrop")
            .with_attribute("media_artist", "Massive Attack")
            .with_attribute("media_album_name", "Mezzanine")
            .with_attribute("media_content_id", "x-sonos-spotify:spotify%3atrack%3a67Hna13dNDkZvBpTXRIaOJ")
            .with_attribute("media_position", 30.0)
            .with_attribute("media_duration", 200.0)
            .with_attribute("volume_level", 0.7)
            .with_attribute("is_volume_muted", false)
            .with_attribute("shuffle", false)
            .with_attribute("repeat", "off")
            .with_attribute("queue_position", 3),
    );

    hass.set_state(
        format!("sensor.{}_queue", player.object_id()).as_str(),
        EntityState::new("3").with_attribute(
            "items",
            json!([
                {"title": "Angel", "artist": "Massive Attack", "album": "Mezzanine", "duration": 379},
                {"title": "Risingson", "artist": "Massive Attack", "album": "Mezzanine", "duration": 298},
                {"title": "Teardrop", "artist": "Massive Attack", "album": "Mezzanine", "duration": 200},
                {"title": "Inertia Creeps", "artist": "Massive Attack", "album": "Mezzanine", "duration": 356},
            ]),
        ),
    );

    player
}

async fn run_session(card: &PlayerCard, hass: &MemoryHass, args: &Args) {
    card.handle_push().await;
    print_player(card);

    tokio::time::sleep(Duration::from_secs(1)).await;
    print_progress(card, "after 1s");

    for step in [args.seek_to - 10.0, args.seek_to - 5.0, args.seek_to] {
        card.seek_input(step).await;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;
    print_progress(card, "after seek");

    for _ in 0..2 {
        let _ = card.toggle_mute().await;
        card.handle_push().await;
    }
    if let PlayerView::Available(now) = card.view().player.get() {
        println!("volume after mute round trip: {:.0}%", now.volume_percent);
    }

    if card.open_queue().await.is_ok() {
        let popup = card.view().queue.get();
        println!("{}", popup.title);
        for row in &popup.rows {
            println!("  {row:?}");
        }
        let _ = card.play_queue_item(args.queue_index).await;
    }
    card.handle_push().await;
    print_player(card);

    if let Some(notice) = card.view().notice.get() {
        println!("notice: {}", notice.message);
    }
    info!(calls = hass.calls().len(), "session complete");
}

fn print_player(card: &PlayerCard) {
    match card.view().player.get() {
        PlayerView::Available(now) => println!(
            "{} - {} ({}) [{}] queue {:?}",
            now.title,
            now.artist,
            now.album,
            now.play_pause_icon(),
            now.queue_position,
        ),
        PlayerView::Unavailable { name } => println!("Player {name} unavailable"),
        PlayerView::Loading => println!("loading"),
    }
}

fn print_progress(card: &PlayerCard, label: &str) {
    let progress = card.view().progress.get();
    println!(
        "{label}: {} / {} ({:.3})",
        progress.current, progress.total, progress.fraction
    );
}
