use sense_bridge::config::Config;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.poll.short_poll_secs = 30;
    cfg.custom_params
        .insert("email".to_string(), "me@example.com".to_string());
    cfg.logging.file = Some(tmp_dir.path().join("logs").to_string_lossy().to_string());

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.poll.short_poll_secs, 30);
    assert_eq!(loaded.poll.long_poll_secs, 240);
    assert_eq!(
        loaded.custom_params.get("email").map(String::as_str),
        Some("me@example.com")
    );
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    assert!(cfg.validate().is_ok());

    cfg.poll.short_poll_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.poll.long_poll_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.sense.api_url.clear();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.sense.realtime_url = "  ".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.sense.timeout_secs = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn inverted_cadence_is_allowed() {
    let mut cfg = Config::default();
    assert!(!cfg.poll_cadence_inverted());
    cfg.poll.short_poll_secs = 300;
    assert!(cfg.validate().is_ok());
    assert!(cfg.poll_cadence_inverted());
}

#[test]
fn load_explicit_path_validates() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"poll:\n  short_poll_secs: 0\n").unwrap();
    let err = Config::load(tmp.path().to_str()).unwrap_err();
    assert!(err.to_string().contains("poll.short_poll_secs"));
}

#[test]
fn empty_file_yields_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let cfg = Config::from_file(tmp.path()).unwrap();
    assert_eq!(cfg.poll.short_poll_secs, 60);
    assert!(cfg.custom_params.is_empty());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}
