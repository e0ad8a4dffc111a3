//! Tests for configuration loading and defaults

use crate::config::{BackendConfig, CacheConfig, Config, Directories};
use chipdeck_types::{ActionConfig, ChipField, UserContext};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.cache.capacity, 100);
    assert!(config.backend.socket_path.is_none());
    assert_eq!(config.backend.request_timeout_ms, 30_000);
    assert!(config.user.is_none());
    assert!(config.chips.is_empty());
}

#[test]
fn test_default_socket_path() {
    let backend = BackendConfig::default();
    assert!(backend.socket_path().ends_with("chipdeck.sock"));
    assert_eq!(backend.request_timeout(), Duration::from_secs(30));
}

#[test]
fn test_configured_socket_path() {
    let backend = BackendConfig {
        socket_path: Some(PathBuf::from("/run/user/1000/ha.sock")),
        ..Default::default()
    };
    assert_eq!(backend.socket_path(), PathBuf::from("/run/user/1000/ha.sock"));
}

#[test]
fn test_config_parse_minimal() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_parse_partial() {
    let json = r#"{ "cache": { "capacity": 5 } }"#;
    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.cache, CacheConfig { capacity: 5 });
    assert_eq!(config.backend, BackendConfig::default());
}

#[test]
fn test_config_parse_full() {
    let json = r##"{
        "cache": { "capacity": 10 },
        "backend": { "socketPath": "/tmp/ha.sock", "requestTimeoutMs": 1500 },
        "user": { "id": "u1", "name": "Robin", "is_admin": true },
        "chips": [
            {
                "entity": "climate.living_room",
                "primary": "{{ state_attr(entity, 'current_temperature') }} °C",
                "icon": "mdi:thermostat",
                "icon_color": "{{ 'red' if is_state(entity, 'heat') else 'grey' }}",
                "tap_action": { "action": "more-info" },
                "double_tap_action": { "action": "call-service", "service": "climate.turn_off" }
            },
            { "primary": "Static [mdi:home]", "max_width": "12" }
        ]
    }"##;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.cache.capacity, 10);
    assert_eq!(config.backend.socket_path(), PathBuf::from("/tmp/ha.sock"));
    assert_eq!(config.backend.request_timeout(), Duration::from_millis(1500));
    assert_eq!(
        config.user,
        Some(UserContext {
            id: "u1".to_string(),
            name: "Robin".to_string(),
            is_admin: true,
        })
    );
    assert_eq!(config.chips.len(), 2);

    let climate = &config.chips[0];
    assert!(climate.is_template(ChipField::Primary));
    assert!(climate.is_template(ChipField::IconColor));
    assert!(!climate.is_template(ChipField::Icon));
    assert_eq!(climate.tap_action, Some(ActionConfig::MoreInfo));
    assert!(matches!(
        climate.double_tap_action,
        Some(ActionConfig::PerformAction { ref perform_action, .. }) if perform_action == "climate.turn_off"
    ));

    assert_eq!(config.template_count(), 2);
}

#[test]
fn test_config_load_missing_file_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(&dir.path().join("missing.json")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_invalid_json() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{ not json").unwrap();

    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, crate::Error::Json(_)));
}

#[test]
fn test_config_load_tolerates_unknown_fields() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        r#"{ "theme": "dark", "chips": [ { "primary": "x", "icn": "mdi:x" } ] }"#,
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.chips.len(), 1);
}

#[test]
fn test_config_save_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::default();
    config.cache.capacity = 7;
    config.backend.socket_path = Some(PathBuf::from("/tmp/x.sock"));
    config.chips.push(
        chipdeck_types::ChipConfig::default()
            .with_field(ChipField::Primary, "{{ now() }}")
            .with_field(ChipField::BadgeIcon, "mdi:clock"),
    );

    config.save(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"socketPath\""));
    assert!(content.contains("\"badge_icon\""));

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_directories_config_file_under_base() {
    let dir = TempDir::new().unwrap();
    let dirs = Directories::with_base(dir.path().to_path_buf());
    dirs.ensure_exists().unwrap();

    Config::default().save(&dirs.config_file).unwrap();
    assert!(dirs.config_file.exists());
}
