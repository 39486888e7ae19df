use std::fs;
use std::time::Duration;

use clap::Parser;
use leaf_bridge::config::{Cli, Config};

#[test]
fn save_and_load_yaml_roundtrip_drops_password() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.account.username = "driver@example.com".to_string();
    cfg.account.password = "secret".to_string();
    cfg.accessory.name = Some("Garage LEAF".to_string());
    cfg.save_to_file(&path).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(!written.contains("secret"));

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.account.username, "driver@example.com");
    assert!(loaded.account.password.is_empty());
    assert_eq!(loaded.accessory.name.as_deref(), Some("Garage LEAF"));
}

#[test]
fn flags_override_file_values() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("leaf.yaml");
    fs::write(
        &path,
        "account:\n  username: file-user\n  password: file-pass\n  country: EU\n\
         gateway:\n  base_url: https://gw.example.com\n\
         update_interval_secs: 600\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "leaf-bridge",
        "--config",
        path.to_str().unwrap(),
        "--username",
        "flag-user",
        "--update-interval",
        "5m",
        "--revert-delay",
        "250ms",
        "--homekit-pin",
        "314-15-926",
    ])
    .unwrap();
    let config = cli.into_config().unwrap();

    assert_eq!(config.account.username, "flag-user");
    assert_eq!(config.account.password, "file-pass");
    assert_eq!(config.account.country, "EU");
    assert_eq!(config.update_interval(), Duration::from_secs(300));
    assert_eq!(config.revert_delay(), Duration::from_millis(250));
    assert!(config.validate().is_ok());
}

#[test]
fn missing_credentials_are_fatal() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("leaf.yaml");
    fs::write(&path, "gateway:\n  base_url: https://gw.example.com\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("username and password required"));
}

#[test]
fn invalid_yaml_is_reported() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("broken.yaml");
    fs::write(&path, "account: [unterminated").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn bad_duration_flag_is_rejected() {
    assert!(Cli::try_parse_from(["leaf-bridge", "--update-interval", "soon"]).is_err());
}
