use super::settings::Settings;
use super::{StoreBackend, load_config_from};

use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.store.backend, StoreBackend::Memory);
    assert_eq!(settings.broadcast.keep_alive_secs, 30);
    assert_eq!(settings.broadcast.delivery_timeout_ms, 2000);
    assert!(!settings.seed.enabled);
    assert_eq!(settings.log.level, "info");
}

#[test]
#[serial]
fn load_config_without_sources_uses_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let missing = tmp.path().join("absent");

    temp_env::with_vars_unset(["RAFFLE_SERVER__PORT", "RAFFLE_SEED__ENABLED"], || {
        let cfg = load_config_from(missing.to_str().unwrap()).expect("load_config failed");
        assert_eq!(cfg.server.port, 8080);
        assert!(!cfg.seed.enabled);
    });
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let base = tmp.path().join("default");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [store]
        backend = "sled"
        path = "/var/lib/raffle"

        [broadcast]
        delivery_timeout_ms = 500
    "#;
    fs::write(base.with_extension("toml"), toml).expect("write config file");

    let cfg = load_config_from(base.to_str().unwrap()).expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.store.backend, StoreBackend::Sled);
    assert_eq!(cfg.store.path, "/var/lib/raffle");
    assert_eq!(cfg.broadcast.delivery_timeout_ms, 500);
    // untouched keys keep their defaults
    assert_eq!(cfg.broadcast.keep_alive_secs, 30);
    assert_eq!(cfg.log.level, "info");
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let base = tmp.path().join("default");
    fs::write(base.with_extension("toml"), "[server]\nport = 9000\n").expect("write config file");

    temp_env::with_vars(
        [
            ("RAFFLE_SERVER__PORT", Some("9100")),
            ("RAFFLE_SEED__ENABLED", Some("true")),
            ("RAFFLE_BROADCAST__IDLE_TIMEOUT_SECS", Some("15")),
        ],
        || {
            let cfg = load_config_from(base.to_str().unwrap()).expect("load_config failed");
            assert_eq!(cfg.server.port, 9100);
            assert!(cfg.seed.enabled);
            assert_eq!(cfg.broadcast.idle_timeout_secs, 15);
        },
    );
}

#[test]
#[serial]
fn shipped_config_matches_builtin_defaults() {
    let shipped = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default");
    temp_env::with_vars_unset(
        [
            "RAFFLE_SERVER__PORT",
            "RAFFLE_STORE__BACKEND",
            "RAFFLE_SEED__ENABLED",
        ],
        || {
            let cfg = load_config_from(shipped).expect("load_config failed");
            let defaults = Settings::default();
            assert_eq!(cfg.store.backend, defaults.store.backend);
            assert_eq!(cfg.store.path, defaults.store.path);
            assert_eq!(cfg.server.port, defaults.server.port);
            assert_eq!(cfg.broadcast.delivery_timeout_ms, defaults.broadcast.delivery_timeout_ms);
            assert_eq!(cfg.seed.enabled, defaults.seed.enabled);
        },
    );
}
