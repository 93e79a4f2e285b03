//! Integration tests driving a player card against the in-memory host.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use sonos_card::{
    CardError, PlayerCard,
    config::CardConfig,
    services::{
        EntityState, MemoryHass, PlayerView,
        card::{NoticeKind, QueueRow},
        media_player::CommandError,
    },
};
use tokio::time::sleep;

const KITCHEN: &str = "media_player.kitchen";

fn playing(position: f64, duration: f64, title: &str) -> EntityState {
    EntityState::new("playing")
        .with_attribute("friendly_name", "Kitchen")
        .with_attribute("media_title", title)
        .with_attribute("media_artist", "Artist")
        .with_attribute("media_position", position)
        .with_attribute("media_duration", duration)
        .with_attribute("volume_level", 0.7)
        .with_attribute("is_volume_muted", false)
        .with_attribute("queue_position", 3)
}

fn setup(hass: MemoryHass, state: EntityState) -> (Arc<MemoryHass>, PlayerCard) {
    let hass = Arc::new(hass);
    hass.set_state(KITCHEN, state);
    let card = PlayerCard::new(hass.clone(), &CardConfig::for_entity(KITCHEN)).unwrap();
    (hass, card)
}

fn number(call: &sonos_card::services::hass::ServiceCall, key: &str) -> f64 {
    call.data.get(key).and_then(Value::as_f64).unwrap()
}

mod configuration {
    use super::*;

    #[test]
    fn missing_entity_halts_setup() {
        let hass = Arc::new(MemoryHass::new());

        let err = PlayerCard::new(hass, &CardConfig::default()).err().unwrap();

        assert!(matches!(err, CardError::MissingEntity));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn first_push_renders_now_playing() {
        let (_hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        assert_eq!(card.view().player.get(), PlayerView::Loading);

        card.handle_push().await;

        let PlayerView::Available(now) = card.view().player.get() else {
            panic!("player should be available");
        };
        assert_eq!(now.title, "A");
        assert_eq!(now.album, "Unknown");
        assert_eq!(now.play_pause_icon(), "mdi:pause");
        assert!((now.volume_percent - 70.0).abs() < 1e-9);
        card.teardown().await;
    }
}

mod estimator {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn extrapolates_between_pushes() {
        let (_hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        sleep(Duration::from_millis(1000)).await;

        let progress = card.progress().await;
        assert!((progress.position - 31.0).abs() < 1e-6);
        assert!((progress.fraction - 0.155).abs() < 1e-6);
        assert_eq!(progress.current, "0:31");
        assert_eq!(progress.total, "3:20");

        sleep(Duration::from_millis(150)).await;
        assert_eq!(card.view().progress.get().current, "0:31");
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn same_title_push_keeps_local_estimate() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;
        sleep(Duration::from_secs(5)).await;

        hass.set_state(KITCHEN, playing(30.0, 200.0, "A"));
        card.handle_push().await;

        assert!((card.estimated_position().await - 35.0).abs() < 1e-6);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn new_title_resets_estimate() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;
        sleep(Duration::from_secs(5)).await;

        hass.set_state(KITCHEN, playing(2.0, 180.0, "B"));
        card.handle_push().await;

        assert!((card.estimated_position().await - 2.0).abs() < 1e-6);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_end_of_track() {
        let (_hass, card) = setup(MemoryHass::new(), playing(199.0, 200.0, "A"));
        card.handle_push().await;

        sleep(Duration::from_secs(3)).await;

        let progress = card.view().progress.get();
        assert_eq!(progress.position, 200.0);
        assert_eq!(progress.fraction, 1.0);
        assert!(!card.is_extrapolating().await);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_ticking() {
        let (_hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.teardown().await;
        let frozen = card.estimated_position().await;
        sleep(Duration::from_secs(2)).await;

        assert!(!card.is_extrapolating().await);
        assert_eq!(card.estimated_position().await, frozen);
        card.handle_push().await;
        assert!(!card.is_extrapolating().await);
    }
}

mod seek {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn drag_issues_one_seek_for_last_target() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.seek_input(40.0).await;
        sleep(Duration::from_millis(100)).await;
        card.seek_input(45.0).await;
        sleep(Duration::from_millis(100)).await;
        card.seek_input(50.0).await;

        assert_eq!(card.view().progress.get().fraction, 0.5);
        assert!(hass.calls_to("media_seek").is_empty());

        sleep(Duration::from_millis(300)).await;

        let seeks = hass.calls_to("media_seek");
        assert_eq!(seeks.len(), 1);
        assert_eq!(number(&seeks[0], "seek_position"), 100.0);
        assert!(!card.view().seeking.get());
        assert!(card.estimated_position().await >= 100.0);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_shows_notice_and_schedules_refresh() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        hass.fail("media_player", "media_seek");
        card.handle_push().await;

        card.seek_input(50.0).await;
        sleep(Duration::from_millis(300)).await;

        let notice = card.view().notice.get().unwrap();
        assert_eq!(notice.message, "Unable to set the new position");
        assert_eq!(notice.kind, NoticeKind::Transient);
        assert!(!card.view().seeking.get());

        sleep(Duration::from_millis(2100)).await;
        assert_eq!(hass.calls_to("update_entity").len(), 1);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(card.view().notice.get(), None);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn missing_duration_is_not_seekable() {
        let state = EntityState::new("playing").with_attribute("media_title", "Stream");
        let (hass, card) = setup(MemoryHass::new(), state);
        card.handle_push().await;

        card.seek_input(50.0).await;
        sleep(Duration::from_millis(300)).await;

        assert!(hass.calls_to("media_seek").is_empty());
        assert_eq!(
            card.view().notice.get().map(|n| n.message),
            Some("Media duration not available".to_string())
        );
        card.teardown().await;
    }
}

mod in_flight {
    use super::*;

    fn slow_host() -> MemoryHass {
        let hass = MemoryHass::new();
        hass.set_latency(Some(Duration::from_millis(400)));
        hass
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_seeks_keep_last_target() {
        let (hass, card) = setup(slow_host(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.seek_input(20.0).await;
        sleep(Duration::from_millis(300)).await;
        card.seek_input(80.0).await;
        sleep(Duration::from_millis(400)).await;

        assert_eq!(hass.calls_to("media_seek").len(), 2);
        assert!(card.view().seeking.get());
        assert_eq!(card.view().progress.get().fraction, 0.8);

        sleep(Duration::from_millis(300)).await;

        assert!(!card.view().seeking.get());
        assert!(card.estimated_position().await >= 160.0);
        assert!(card.view().progress.get().fraction >= 0.8);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn push_during_seek_keeps_dragged_bar() {
        let (hass, card) = setup(slow_host(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.seek_input(50.0).await;
        sleep(Duration::from_millis(300)).await;
        hass.set_state(KITCHEN, playing(40.0, 200.0, "A"));
        card.handle_push().await;

        assert!(card.view().seeking.get());
        assert_eq!(card.view().progress.get().fraction, 0.5);

        sleep(Duration::from_millis(400)).await;

        assert!(!card.view().seeking.get());
        assert!(card.estimated_position().await >= 100.0);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_during_seek_schedules_nothing() {
        let (hass, card) = setup(slow_host(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.seek_input(50.0).await;
        sleep(Duration::from_millis(300)).await;
        card.teardown().await;
        sleep(Duration::from_secs(3)).await;

        assert_eq!(hass.service_names(), vec!["media_seek"]);
        assert!(!card.view().seeking.get());
        assert_eq!(card.view().notice.get(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_shows_notice() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        hass.fail("homeassistant", "update_entity");
        card.handle_push().await;

        card.seek_input(50.0).await;
        sleep(Duration::from_millis(2400)).await;

        assert_eq!(hass.calls_to("update_entity").len(), 1);
        assert_eq!(
            card.view().notice.get().map(|n| n.message),
            Some("Unable to refresh the player state".to_string())
        );
        assert!(card.view().player.get().is_available());
        card.teardown().await;
    }
}

mod play_pause {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_and_resyncs_position() {
        let (hass, card) = setup(MemoryHass::with_echo(), playing(30.0, 200.0, "A"));
        card.handle_push().await;
        sleep(Duration::from_secs(2)).await;

        card.play_pause().await.unwrap();

        assert!(!card.is_extrapolating().await);
        assert_eq!(
            hass.service_names(),
            vec!["media_pause", "media_seek", "update_entity"]
        );
        assert_eq!(number(&hass.calls_to("media_seek")[0], "seek_position"), 32.0);
        assert!((card.estimated_position().await - 32.0).abs() < 1e-6);

        sleep(Duration::from_millis(600)).await;
        let PlayerView::Available(now) = card.view().player.get() else {
            panic!("player should be available");
        };
        assert!(!now.playing);
        assert!((card.estimated_position().await - 32.0).abs() < 1e-6);

        card.play_pause().await.unwrap();
        card.handle_push().await;
        assert!(card.is_extrapolating().await);
        assert_eq!(hass.calls_to("media_play").len(), 1);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_pause_shows_notice() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        hass.fail("media_player", "media_pause");
        card.handle_push().await;

        let err = card.play_pause().await.unwrap_err();

        assert!(matches!(err, CommandError::Failed { command: "media_pause", .. }));
        assert!(hass.calls_to("media_seek").is_empty());
        assert!(card.view().notice.get().is_some());
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_resync_names_the_seek() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        hass.fail("media_player", "media_seek");
        card.handle_push().await;

        let err = card.play_pause().await.unwrap_err();

        assert_eq!(err.command(), Some("media_seek"));
        let message = card.view().notice.get().unwrap().message;
        assert!(message.starts_with("Unable to media_seek:"), "{message}");
        card.teardown().await;
    }
}

mod volume {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn mute_round_trip_restores_level() {
        let (hass, card) = setup(MemoryHass::with_echo(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.toggle_mute().await.unwrap();
        card.handle_push().await;
        assert_eq!(card.remembered_volume().await, Some(0.7));

        card.toggle_mute().await.unwrap();
        card.handle_push().await;

        assert_eq!(
            hass.service_names(),
            vec!["volume_mute", "volume_set", "volume_mute"]
        );
        assert_eq!(number(&hass.calls_to("volume_set")[0], "volume_level"), 0.7);
        assert_eq!(card.remembered_volume().await, None);
        let PlayerView::Available(now) = card.view().player.get() else {
            panic!("player should be available");
        };
        assert!(!now.muted);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unmute_without_memory_uses_default() {
        let state = playing(30.0, 200.0, "A").with_attribute("is_volume_muted", true);
        let (hass, card) = setup(MemoryHass::new(), state);
        card.handle_push().await;

        card.toggle_mute().await.unwrap();

        let calls = hass.calls();
        assert_eq!(calls[0].data, json!({"entity_id": KITCHEN, "volume_level": 0.5}));
        assert_eq!(calls[1].data, json!({"entity_id": KITCHEN, "is_volume_muted": false}));
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_mute_forgets_level() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        hass.fail("media_player", "volume_mute");
        card.handle_push().await;

        assert!(card.toggle_mute().await.is_err());
        assert_eq!(card.remembered_volume().await, None);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_unmute_keeps_level() {
        let (hass, card) = setup(MemoryHass::with_echo(), playing(30.0, 200.0, "A"));
        card.handle_push().await;
        card.toggle_mute().await.unwrap();
        card.handle_push().await;

        hass.fail_times("media_player", "volume_set", 1);
        hass.fail_times("media_player", "volume_mute", 1);
        assert!(card.toggle_mute().await.is_err());
        card.handle_push().await;
        assert_eq!(card.remembered_volume().await, Some(0.7));

        hass.clear_calls();
        card.toggle_mute().await.unwrap();

        assert_eq!(number(&hass.calls_to("volume_set")[0], "volume_level"), 0.7);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn external_unmute_clears_memory() {
        let (hass, card) = setup(MemoryHass::with_echo(), playing(30.0, 200.0, "A"));
        card.handle_push().await;
        card.toggle_mute().await.unwrap();

        hass.set_state(KITCHEN, playing(30.0, 200.0, "A"));
        card.handle_push().await;
        assert_eq!(card.remembered_volume().await, Some(0.7));

        hass.set_state(
            KITCHEN,
            playing(30.0, 200.0, "A").with_attribute("is_volume_muted", true),
        );
        card.handle_push().await;
        hass.set_state(KITCHEN, playing(30.0, 200.0, "A"));
        card.handle_push().await;

        assert_eq!(card.remembered_volume().await, None);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slider_sets_level() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.set_volume(35.0).await.unwrap();

        assert!((number(&hass.calls_to("volume_set")[0], "volume_level") - 0.35).abs() < 1e-9);
        card.teardown().await;
    }
}

mod controls {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn shuffle_and_repeat_follow_state() {
        let state = playing(30.0, 200.0, "A")
            .with_attribute("shuffle", true)
            .with_attribute("repeat", "all");
        let (hass, card) = setup(MemoryHass::new(), state);
        card.handle_push().await;

        card.toggle_shuffle().await.unwrap();
        card.cycle_repeat().await.unwrap();

        assert_eq!(hass.calls_to("shuffle_set")[0].data["shuffle"], json!(false));
        assert_eq!(hass.calls_to("repeat_set")[0].data["repeat"], json!("one"));
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn track_skips_and_force_update() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.next_track().await.unwrap();
        card.previous_track().await.unwrap();
        card.force_update().await.unwrap();

        assert_eq!(
            hass.service_names(),
            vec!["media_next_track", "media_previous_track", "update_entity"]
        );
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_targets_resolved_entity() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.toggle().await.unwrap();

        let call = &hass.calls()[0];
        assert_eq!(call.name(), "input_boolean.toggle");
        assert_eq!(call.data, json!({"entity_id": KITCHEN}));
        card.teardown().await;
    }
}

mod queue {
    use super::*;

    fn seed_queue(hass: &MemoryHass) {
        hass.set_state(
            "sensor.kitchen_queue",
            EntityState::new("4").with_attribute(
                "items",
                json!([
                    {"title": "One", "artist": "X", "album": "Y", "duration": 200},
                    {"title": "Two"},
                    {"title": "Three", "duration": 61},
                    {"title": "Four"},
                ]),
            ),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn jump_back_issues_previous_then_play() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        let plan = card.play_queue_item(0).await.unwrap();

        assert_eq!(plan.steps, 2);
        assert_eq!(
            hass.service_names(),
            vec!["media_previous_track", "media_previous_track", "media_play"]
        );

        sleep(Duration::from_millis(600)).await;
        assert_eq!(hass.calls_to("update_entity").len(), 1);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn float_cursor_still_navigates() {
        let state = playing(30.0, 200.0, "A").with_attribute("queue_position", 3.0);
        let (hass, card) = setup(MemoryHass::new(), state);
        card.handle_push().await;

        let plan = card.play_queue_item(0).await.unwrap();

        assert_eq!(plan.steps, 2);
        assert_eq!(
            hass.service_names(),
            vec!["media_previous_track", "media_previous_track", "media_play"]
        );
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_step_aborts_jump() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        hass.fail_times("media_player", "media_next_track", 1);
        card.handle_push().await;

        let err = card.play_queue_item(5).await.unwrap_err();

        assert_eq!(err.completed, 0);
        assert_eq!(hass.service_names(), vec!["media_next_track"]);
        assert_eq!(
            card.view().notice.get().map(|n| n.message),
            Some("Unable to play the selected track".to_string())
        );
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn popup_lists_queue_and_tracks_cursor() {
        let (hass, card) = setup(MemoryHass::with_echo(), playing(30.0, 200.0, "A"));
        seed_queue(&hass);
        card.handle_push().await;

        card.open_queue().await.unwrap();

        let popup = card.view().queue.get();
        assert!(popup.visible);
        assert_eq!(popup.title, "Queue of Kitchen");
        assert_eq!(popup.rows.len(), 4);
        assert_eq!(popup.current_index(), Some(2));
        assert_eq!(
            popup.rows[1],
            QueueRow::Track {
                index: 1,
                title: "Two".to_string(),
                artist: "Unknown Artist".to_string(),
                album: "Unknown Album".to_string(),
                duration: String::new(),
                current: false,
            }
        );
        assert_eq!(hass.service_names(), vec!["get_queue"]);

        card.next_track().await.unwrap();
        card.handle_push().await;
        assert_eq!(card.view().queue.get().current_index(), Some(3));

        card.play_queue_item(0).await.unwrap();
        assert!(!card.view().queue.get().visible);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn missing_sensor_shows_placeholder() {
        let (_hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        card.open_queue().await.unwrap();

        let popup = card.view().queue.get();
        assert_eq!(
            popup.rows,
            vec![QueueRow::Placeholder("Queue information not available".to_string())]
        );
        assert!(card.view().notice.get().is_some());

        card.close_queue();
        assert!(!card.view().queue.get().visible);
        card.teardown().await;
    }
}

mod availability {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn unavailable_mode_suppresses_controls() {
        let state = EntityState::new("unavailable").with_attribute("friendly_name", "Kitchen");
        let (hass, card) = setup(MemoryHass::new(), state);

        card.handle_push().await;

        assert_eq!(
            card.view().player.get(),
            PlayerView::Unavailable {
                name: "Kitchen".to_string()
            }
        );
        let notice = card.view().notice.get().unwrap();
        assert_eq!(notice.message, "Player Kitchen unavailable");
        assert_eq!(notice.kind, NoticeKind::Persistent);
        assert!(!card.is_extrapolating().await);
        assert!(matches!(
            card.play_pause().await,
            Err(CommandError::Unavailable(_))
        ));
        assert!(hass.calls().is_empty());

        hass.set_state(KITCHEN, playing(10.0, 200.0, "A"));
        card.handle_push().await;

        assert!(card.view().player.get().is_available());
        assert_eq!(card.view().notice.get(), None);
        assert!(card.is_extrapolating().await);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn removed_player_falls_back_to_entity_id() {
        let (hass, card) = setup(MemoryHass::new(), playing(30.0, 200.0, "A"));
        card.handle_push().await;

        hass.remove_state(&KITCHEN.into());
        card.handle_push().await;

        assert_eq!(
            card.view().player.get(),
            PlayerView::Unavailable {
                name: KITCHEN.to_string()
            }
        );
        assert!(!card.is_extrapolating().await);
        card.teardown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn helper_entity_selects_player() {
        let hass = Arc::new(MemoryHass::new());
        hass.set_state("input_text.sonos_target", EntityState::new("media_player.office"));
        hass.set_state("media_player.office", playing(30.0, 200.0, "A"));
        let card =
            PlayerCard::new(hass.clone(), &CardConfig::for_entity("input_text.sonos_target"))
                .unwrap();

        card.handle_push().await;
        card.next_track().await.unwrap();

        assert_eq!(
            card.player().await.map(|p| p.to_string()),
            Some("media_player.office".to_string())
        );
        assert_eq!(
            hass.calls()[0].data,
            json!({"entity_id": "media_player.office"})
        );

        hass.set_state("input_text.sonos_target", EntityState::new(""));
        card.handle_push().await;

        assert_eq!(
            card.view().player.get(),
            PlayerView::Unavailable {
                name: "input_text.sonos_target".to_string()
            }
        );
        card.teardown().await;
    }
}
