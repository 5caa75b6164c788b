use elb2loki::config::{generate::generate_starter_config, load_config, ConfigError, StorageBackend};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");

    fs::write(
        &config_path,
        r#"
server:
  listen: 127.0.0.1:8181
ingest:
  endpoint: https://logs.example.net/loki/api/v1/push
  user: "1001"
  token: "$env{ELB2LOKI_CONFIG_TEST_TOKEN}"
  level: warn
storage:
  backend: local
  root: /srv/buckets
  timeout: 2s
"#,
    )
    .unwrap();

    std::env::set_var("ELB2LOKI_CONFIG_TEST_TOKEN", "from-env");
    let config = load_config(&config_path);
    std::env::remove_var("ELB2LOKI_CONFIG_TEST_TOKEN");

    let config = config.expect("config should be valid");
    assert_eq!(config.server.listen, "127.0.0.1:8181");
    assert_eq!(config.ingest.token, "from-env");
    assert_eq!(config.ingest.level, "warn");
    assert_eq!(config.storage.timeout, Duration::from_secs(2));
    assert!(matches!(
        config.storage.backend,
        StorageBackend::Local { ref root } if root.to_str() == Some("/srv/buckets")
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_config(&temp_dir.path().join("absent.yml")).unwrap_err();

    assert!(matches!(err, ConfigError::Io(_)));
    assert!(err.to_string().contains("absent.yml"));
}

#[test]
fn test_unknown_backend_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(
        &config_path,
        "ingest:\n  endpoint: http://loki\n  user: u\n  token: t\nstorage:\n  backend: ftp\n",
    )
    .unwrap();

    assert!(load_config(&config_path).is_err());
}

#[test]
fn test_unset_variable_names_the_variable() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yml");
    fs::write(&config_path, generate_starter_config().replace("LOKI_USER", "ELB2LOKI_NEVER_SET_USER")).unwrap();

    let err = load_config(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("ELB2LOKI_NEVER_SET_USER"));
}
