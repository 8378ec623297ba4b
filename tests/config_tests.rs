use std::io::Write;

use meter_readings::config::IngestConfig;
use meter_readings::error::ConfigError;
use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults() {
    let config = IngestConfig::default();
    assert_eq!(config.min_value, dec!(0));
    assert_eq!(config.max_value, dec!(99999));
}

#[test]
fn test_load_from_file() {
    let file = write_config(r#"{ "minMeterReadingValue": 10, "maxMeterReadingValue": 5000 }"#);

    let config = IngestConfig::from_file(file.path()).unwrap();
    assert_eq!(config.min_value, dec!(10));
    assert_eq!(config.max_value, dec!(5000));
}

#[test]
fn test_missing_keys_use_defaults() {
    let file = write_config(r#"{ "maxMeterReadingValue": 500 }"#);

    let config = IngestConfig::from_file(file.path()).unwrap();
    assert_eq!(config.min_value, dec!(0));
    assert_eq!(config.max_value, dec!(500));
}

#[test]
fn test_inverted_range_in_file_rejected() {
    let file = write_config(r#"{ "minMeterReadingValue": 10, "maxMeterReadingValue": 5 }"#);

    assert!(matches!(
        IngestConfig::from_file(file.path()),
        Err(ConfigError::InvalidRange { .. })
    ));
}

#[test]
fn test_malformed_file_rejected() {
    let file = write_config("not json");

    assert!(matches!(
        IngestConfig::from_file(file.path()),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn test_missing_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    assert!(matches!(
        IngestConfig::from_file(&path),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_overrides_apply_on_top() {
    let config = IngestConfig::default()
        .with_overrides(None, Some(dec!(250)))
        .unwrap();

    assert_eq!(config.min_value, dec!(0));
    assert_eq!(config.max_value, dec!(250));
}

#[test]
fn test_override_that_inverts_range_rejected() {
    let result = IngestConfig::default().with_overrides(Some(dec!(100000)), None);

    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "minimum value 100000 is greater than maximum value 99999"
    );
}
