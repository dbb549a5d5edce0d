use cloudfiles_storage::{CredentialSource, StorageError};
use pretty_assertions::assert_eq;
use serde_yaml::{Mapping, Value};
use std::io::Cursor;

const FLAT: &str = "
username: acme
api_key: 0123abcd
servicenet: true
container: uploads
";

const BY_ENVIRONMENT: &str = "
production:
  username: acme
  api_key: prod-key
  servicenet: true
development:
  username: acme-dev
  api_key: dev-key
";

#[test]
fn flat_file_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloudfiles.yml");
    std::fs::write(&path, FLAT).unwrap();

    let creds = CredentialSource::path(&path).resolve(None).unwrap();
    assert_eq!(creds.username, "acme");
    assert_eq!(creds.api_key, "0123abcd");
    assert!(creds.servicenet);
    assert_eq!(creds.container.as_deref(), Some("uploads"));
}

#[test]
fn environment_section_selected() {
    let creds = CredentialSource::reader(Cursor::new(BY_ENVIRONMENT))
        .resolve(Some("development"))
        .unwrap();
    assert_eq!(creds.username, "acme-dev");
    assert_eq!(creds.api_key, "dev-key");
    assert!(!creds.servicenet);
}

#[test]
fn environment_ignored_when_absent_from_flat_file() {
    let creds = CredentialSource::reader(Cursor::new(FLAT))
        .resolve(Some("staging"))
        .unwrap();
    assert_eq!(creds.username, "acme");
}

#[test]
fn environment_file_without_matching_section_fails() {
    let err = CredentialSource::reader(Cursor::new(BY_ENVIRONMENT))
        .resolve(Some("staging"))
        .unwrap_err();
    assert!(matches!(err, StorageError::Config(_)));
}

#[test]
fn inline_mapping_with_symbol_keys() {
    let mut mapping = Mapping::new();
    mapping.insert(Value::from(":username"), Value::from("acme"));
    mapping.insert(Value::from(":api_key"), Value::from("k"));
    mapping.insert(Value::from(":servicenet"), Value::from("true"));

    let creds = CredentialSource::inline(mapping).resolve(None).unwrap();
    assert_eq!(creds.username, "acme");
    assert!(creds.servicenet);
    assert_eq!(creds.container, None);
}

#[test]
fn non_mapping_document_is_config_error() {
    let err = CredentialSource::reader(Cursor::new("- just\n- a list\n"))
        .resolve(None)
        .unwrap_err();
    assert!(matches!(err, StorageError::Config(_)));
    assert!(err.to_string().contains("a list"));
}

#[test]
fn missing_api_key_is_config_error() {
    let err = CredentialSource::reader(Cursor::new("username: acme\n"))
        .resolve(None)
        .unwrap_err();
    assert!(matches!(err, StorageError::Config(_)));
}

#[test]
fn empty_username_is_config_error() {
    let err = CredentialSource::reader(Cursor::new("username: ''\napi_key: k\n"))
        .resolve(None)
        .unwrap_err();
    assert!(err.to_string().contains("empty username"));
}

#[test]
fn missing_file_is_config_error() {
    let err = CredentialSource::path("/nonexistent/cloudfiles.yml")
        .resolve(None)
        .unwrap_err();
    assert!(matches!(err, StorageError::Config(_)));
}

#[test]
fn malformed_yaml_is_yaml_error() {
    let err = CredentialSource::reader(Cursor::new("username: [unclosed"))
        .resolve(None)
        .unwrap_err();
    assert!(matches!(err, StorageError::Yaml(_)));
}

#[test]
fn debug_redacts_api_key() {
    let creds = CredentialSource::reader(Cursor::new(FLAT)).resolve(None).unwrap();
    let printed = format!("{creds:?}");
    assert!(!printed.contains("0123abcd"));
    assert!(printed.contains("acme"));
}

#[test]
fn unquoted_numeric_values_read_as_strings() {
    let creds = CredentialSource::reader(Cursor::new("username: 1001\napi_key: 4815162342\n"))
        .resolve(None)
        .unwrap();
    assert_eq!(creds.username, "1001");
    assert_eq!(creds.api_key, "4815162342");
}

#[test]
fn unquoted_float_key_asks_for_quotes() {
    let err = CredentialSource::reader(Cursor::new("username: acme\napi_key: 1.50\n"))
        .resolve(None)
        .unwrap_err();
    assert!(matches!(err, StorageError::Config(_)));
    assert!(err.to_string().contains("quote it"));
}

#[test]
fn quoted_numeric_key_is_kept_verbatim() {
    let creds = CredentialSource::reader(Cursor::new("username: acme\napi_key: '123e4567'\n"))
        .resolve(None)
        .unwrap();
    assert_eq!(creds.api_key, "123e4567");
}
