//! Configuration loading from TOML files and the environment.

mod support;

use std::io::Write;

use support::db_ca;
use warden_core::DeterministicBackend;
use warden_trust::ConfigError;
use warden_trust::DefaultTrustStore;
use warden_trust::TrustService;
use warden_trust::TrustStoreConfig;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config_from_file() {
    let file = write_config(
        r#"
authorities_prefix = "trust"
deactivated_segment = "retired"
range_limit = 100

[equivalence]
ignore_expires = true
"#,
    );

    let config = TrustStoreConfig::from_toml_file(file.path()).unwrap();

    assert_eq!(config.authorities_prefix, "trust");
    assert_eq!(config.deactivated_segment, "retired");
    assert_eq!(config.range_limit, Some(100));
    assert!(config.equivalence.ignore_expires);
    assert!(!config.equivalence.ignore_rotation);
    config.validate().unwrap();
}

#[test]
fn test_empty_file_yields_defaults() {
    let file = write_config("");
    let config = TrustStoreConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config, TrustStoreConfig::default());
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = write_config("range_limit = \"many\"\n");
    let err = TrustStoreConfig::from_toml_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
    assert!(err.to_string().contains("failed to parse TOML config file"));
}

#[tokio::test]
async fn test_store_uses_loaded_prefix() {
    let file = write_config("authorities_prefix = \"trust\"\n");
    let config = TrustStoreConfig::from_toml_file(file.path()).unwrap();
    let backend = DeterministicBackend::new();
    let store = DefaultTrustStore::with_config(backend.clone(), config).unwrap();

    store.create_cert_authority(&db_ca("example.com")).await.unwrap();

    let keys: Vec<String> = backend.keys().await.iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["/trust/db/example.com".to_string()]);
}

#[test]
fn test_invalid_loaded_config_is_rejected_by_store() {
    let file = write_config("deactivated_segment = \"a/b\"\n");
    let config = TrustStoreConfig::from_toml_file(file.path()).unwrap();
    let err = DefaultTrustStore::with_config(DeterministicBackend::new(), config).err().unwrap();
    assert!(matches!(err, ConfigError::Validation { .. }));
}

const ENV_VARS: [&str; 5] = [
    "WARDEN_AUTHORITIES_PREFIX",
    "WARDEN_DEACTIVATED_SEGMENT",
    "WARDEN_RANGE_LIMIT",
    "WARDEN_EQUIVALENCE_IGNORE_EXPIRES",
    "WARDEN_EQUIVALENCE_IGNORE_ROTATION",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

// One test owns every WARDEN_* variable; the process environment is shared
// by all tests in this binary.
#[test]
fn test_env_overrides() {
    clear_env();
    assert_eq!(TrustStoreConfig::from_env(), TrustStoreConfig::default());

    std::env::set_var("WARDEN_AUTHORITIES_PREFIX", "trust");
    std::env::set_var("WARDEN_DEACTIVATED_SEGMENT", "retired");
    std::env::set_var("WARDEN_RANGE_LIMIT", "50");
    std::env::set_var("WARDEN_EQUIVALENCE_IGNORE_EXPIRES", "true");
    std::env::set_var("WARDEN_EQUIVALENCE_IGNORE_ROTATION", "true");
    let config = TrustStoreConfig::from_env();
    assert_eq!(config.authorities_prefix, "trust");
    assert_eq!(config.deactivated_segment, "retired");
    assert_eq!(config.range_limit, Some(50));
    assert!(config.equivalence.ignore_expires);
    assert!(config.equivalence.ignore_rotation);

    // Values that fail to parse leave the field untouched.
    std::env::set_var("WARDEN_RANGE_LIMIT", "lots");
    std::env::set_var("WARDEN_EQUIVALENCE_IGNORE_EXPIRES", "maybe");
    let file = write_config("range_limit = 100\n");
    let mut loaded = TrustStoreConfig::from_toml_file(file.path()).unwrap();
    loaded.apply_env_overrides();
    assert_eq!(loaded.range_limit, Some(100));
    assert!(!loaded.equivalence.ignore_expires);
    assert_eq!(loaded.authorities_prefix, "trust");
    assert!(loaded.equivalence.ignore_rotation);

    clear_env();
}
