use rally_config::{Config, Units, load_file};
use std::fs;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let cfg = load_file(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.odometer_calibration, 1.0);
}

#[test]
fn persisted_calibration_survives_reload_and_keeps_other_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rallycomp.toml");
    fs::write(
        &path,
        "units = \"miles\"\n\n[timezone]\noffset_hours = 2\n",
    )
    .unwrap();

    let mut cfg = load_file(&path).unwrap();
    cfg.persist_calibration(&path, 0.987).unwrap();

    let reloaded = load_file(&path).unwrap();
    assert_eq!(reloaded.odometer_calibration, 0.987);
    assert_eq!(reloaded.units, Units::Miles);
    assert_eq!(reloaded.timezone.offset_hours, 2.0);
    reloaded.validate().unwrap();
    // no temp file left behind
    assert!(!dir.path().join("rallycomp.new").exists());
}

#[test]
fn refuses_to_persist_invalid_calibration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    let mut cfg = Config::default();
    assert!(cfg.persist_calibration(&path, f64::INFINITY).is_err());
    assert!(cfg.persist_calibration(&path, 0.0).is_err());
    assert!(!path.exists());
}

#[test]
fn default_config_round_trips() {
    let text = Config::default().to_toml_string().unwrap();
    let back = rally_config::load_toml(&text).unwrap();
    back.validate().unwrap();
}
