//! Configuration loading tests

use ledger_cli::{CliError, LedgerConfig};
use std::io::Write;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write config");
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
        [storage]
        database_url = "sqlite://./tmp/test.db"

        [remote]
        url = "https://ledger.example.com"
        timeout_secs = 5
        "#,
    );

    let config = LedgerConfig::load_from(Some(file.path())).unwrap();

    assert_eq!(config.storage.database_url, "sqlite://./tmp/test.db");
    assert_eq!(config.remote.url(), Some("https://ledger.example.com"));
    assert_eq!(config.remote.timeout_secs, 5);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_sections_use_defaults() {
    let file = write_config("[remote]\nurl = \"http://localhost:5000\"\n");

    let config = LedgerConfig::load_from(Some(file.path())).unwrap();

    assert_eq!(config.storage.database_url, "sqlite://./data/ledger.db");
    assert_eq!(config.remote.timeout_secs, 30);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let result = LedgerConfig::load_from(Some(std::path::Path::new("/nonexistent/ledger.toml")));
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn test_invalid_file_values_fail_validation() {
    let file = write_config("[remote]\nurl = \"ftp://example.com\"\n");

    let config = LedgerConfig::load_from(Some(file.path())).unwrap();
    assert!(config.validate().is_err());
}
