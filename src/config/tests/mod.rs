//! Unit tests for config module
//!
//! Tests defaults, validation and TOML parsing.

#![allow(clippy::panic)]

use std::io::Write;

use crate::{
    CardError,
    config::{CardConfig, LogLevel, STUB_ENTITY, TimingConfig},
};

#[test]
fn config_default_has_no_entity() {
    let config = CardConfig::default();

    assert!(config.entity.is_none());
    assert!(matches!(config.validate(), Err(CardError::MissingEntity)));
}

#[test]
fn config_stub_targets_placeholder() {
    let config = CardConfig::stub();

    assert_eq!(config.entity.as_deref(), Some(STUB_ENTITY));
    assert_eq!(config.header.as_deref(), Some(""));
    assert_eq!(config.header(), None);
    assert!(config.validate().is_ok());
}

#[test]
fn config_blank_entity_is_missing() {
    let config = CardConfig::for_entity("   ");

    assert!(matches!(config.validate(), Err(CardError::MissingEntity)));
}

#[test]
fn config_entity_without_domain_is_invalid() {
    let config = CardConfig::for_entity("kitchen");

    match config.validate() {
        Err(CardError::InvalidConfig { field, .. }) => assert_eq!(field, "entity"),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        entity = "media_player.kitchen"
        header = "Kitchen"
        log_level = "debug"

        [timing]
        seek_debounce_ms = 400
    "#;

    let config = CardConfig::from_toml_str(toml_str).unwrap();

    assert_eq!(config.validate().unwrap(), "media_player.kitchen");
    assert_eq!(config.header(), Some("Kitchen"));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.timing.seek_debounce_ms, 400);
    assert_eq!(config.timing.tick_ms, TimingConfig::default().tick_ms);
}

#[test]
fn config_missing_entity_in_toml_is_fatal() {
    let err = CardConfig::from_toml_str("header = \"Living room\"").unwrap_err();

    assert!(matches!(err, CardError::MissingEntity));
    assert!(err.is_fatal());
}

#[test]
fn config_zero_timing_rejected() {
    let toml_str = r#"
        entity = "media_player.kitchen"

        [timing]
        tick_ms = 0
    "#;

    match CardConfig::from_toml_str(toml_str) {
        Err(CardError::InvalidConfig { field, .. }) => assert_eq!(field, "timing.tick_ms"),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn config_invalid_toml_reports_location() {
    match CardConfig::from_toml_str("entity = ") {
        Err(CardError::TomlParse { location, .. }) => assert_eq!(location, "string"),
        other => panic!("expected TomlParse, got {other:?}"),
    }
}

#[test]
fn config_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "entity = \"input_text.sonos_target\"").unwrap();

    let config = CardConfig::load(file.path()).unwrap();

    assert_eq!(config.entity.as_deref(), Some("input_text.sonos_target"));
}

#[test]
fn config_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = CardConfig::load(&dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, CardError::Io(_)));
}

#[test]
fn config_serialize_roundtrip() {
    let original = CardConfig::for_entity("media_player.office");

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized: CardConfig = toml::from_str(&toml_str).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn config_schema_lists_entity() {
    let schema = serde_json::to_value(CardConfig::json_schema()).unwrap();

    assert!(schema["properties"]["entity"].is_object());
    assert!(schema["properties"]["timing"].is_object());
}

#[test]
fn log_level_display_matches_serde() {
    assert_eq!(LogLevel::Trace.to_string(), "trace");
    assert_eq!(LogLevel::default(), LogLevel::Info);
}
