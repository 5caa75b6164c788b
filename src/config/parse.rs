use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, ENV_VAR_PATTERN};
use regex::Regex;
use std::fs::File;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Environment variables that override the ingestion settings.
pub const ENV_ENDPOINT: &str = "LOKI_URL";
pub const ENV_USER: &str = "LOKI_USER";
pub const ENV_TOKEN: &str = "LOKI_TOKEN";

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config_file(path)?;
    finish(config, |name| std::env::var(name).ok())
}

/// Loads `path` if given, otherwise starts from the built-in defaults.
/// Environment overrides and validation apply either way.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finish(Config::default(), |name| std::env::var(name).ok()),
    }
}

pub fn parse_config_str<F>(yaml: &str, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let yaml = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml)?;
    let config: Config = serde_yaml::from_str(&yaml)?;
    finish(config, env)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    let yaml_string = expand_env_vars(&yaml_string);
    check_unexpanded_vars(&yaml_string)?;

    serde_yaml::from_str(&yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        ))
    })
}

fn finish<F>(mut config: Config, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, env);
    expand_paths(&mut config);
    validate_config(&config)?;
    Ok(config)
}

fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let set = |target: &mut String, name: &str| {
        if let Some(value) = env(name).filter(|v| !v.is_empty()) {
            *target = value;
        }
    };

    set(&mut config.ingest.endpoint, ENV_ENDPOINT);
    set(&mut config.ingest.user, ENV_USER);
    set(&mut config.ingest.token, ENV_TOKEN);
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut unexpanded_vars: Vec<String> = re
        .captures_iter(yaml_string)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    let error_msg = if unexpanded_vars.len() == 1 {
        format!(
            "Environment variable $env{{{0}}} is not set.\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variable: export {0}=...\n\
             2. Replace $env{{{0}}} in the config file with a literal value",
            unexpanded_vars[0]
        )
    } else {
        format!(
            "Environment variables are not set: {}\n\
             \n\
             To fix this, either:\n\
             1. Set the environment variables\n\
             2. Replace the variables in the config file with literal values",
            unexpanded_vars.join(", ")
        )
    };

    Err(ConfigError::Validation(error_msg))
}

fn expand_paths(config: &mut Config) {
    if let StorageBackend::Local { root } = &mut config.storage.backend {
        *root = expand_tilde(root);
    }
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.server.listen.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "server.listen: '{}' is not a socket address",
            config.server.listen
        ));
    }

    let ingest = &config.ingest;
    if ingest.endpoint.is_empty() {
        errors.push(format!(
            "ingest.endpoint: not set (set it in the config or via {})",
            ENV_ENDPOINT
        ));
    } else if !(ingest.endpoint.starts_with("http://") || ingest.endpoint.starts_with("https://"))
    {
        errors.push(format!(
            "ingest.endpoint: '{}' must be an http(s) URL",
            ingest.endpoint
        ));
    }
    if ingest.user.is_empty() {
        errors.push(format!("ingest.user: not set (or set {})", ENV_USER));
    }
    if ingest.token.is_empty() {
        errors.push(format!("ingest.token: not set (or set {})", ENV_TOKEN));
    }
    if ingest.max_batch_entries == 0 {
        errors.push("ingest.max_batch_entries: must be at least 1".to_string());
    }
    if ingest.level.is_empty() {
        errors.push("ingest.level: must not be empty".to_string());
    }
    if matches!(&ingest.job, Some(job) if job.is_empty()) {
        errors.push("ingest.job: must not be empty".to_string());
    }

    match &config.storage.backend {
        StorageBackend::Local { root } => {
            if root.as_os_str().is_empty() {
                errors.push("storage.root: must not be empty".to_string());
            }
        }
        StorageBackend::Http { base_url } => {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                errors.push(format!(
                    "storage.base_url: '{}' must be an http(s) URL",
                    base_url
                ));
            }
        }
    }

    if config.pipeline.max_in_flight == 0 {
        errors.push("pipeline.max_in_flight: must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    const FULL: &str = r#"
server:
  listen: 127.0.0.1:9090
ingest:
  endpoint: https://logs.example.net/loki/api/v1/push
  user: "1234"
  token: secret
  job: alb-east
  timeout: 3s
  max_batch_entries: 50
storage:
  backend: http
  base_url: http://127.0.0.1:9000
  timeout: 500ms
pipeline:
  max_in_flight: 8
"#;

    #[test]
    fn test_full_config() {
        let config = parse_config_str(FULL, no_env).unwrap();

        assert_eq!(config.server.listen, "127.0.0.1:9090");
        assert_eq!(config.ingest.user, "1234");
        assert_eq!(config.ingest.job_label(), "alb-east");
        assert_eq!(config.ingest.level, "info");
        assert_eq!(config.ingest.timeout, Duration::from_secs(3));
        assert_eq!(config.ingest.max_batch_entries, 50);
        assert!(matches!(
            &config.storage.backend,
            StorageBackend::Http { base_url } if base_url == "http://127.0.0.1:9000"
        ));
        assert_eq!(config.storage.timeout, Duration::from_millis(500));
        assert_eq!(config.pipeline.max_in_flight, 8);
    }

    #[test]
    fn test_env_overrides_credentials() {
        let env = |name: &str| match name {
            "LOKI_USER" => Some("env-user".to_string()),
            "LOKI_TOKEN" => Some("env-token".to_string()),
            _ => None,
        };
        let config = parse_config_str(FULL, env).unwrap();

        assert_eq!(config.ingest.user, "env-user");
        assert_eq!(config.ingest.token, "env-token");
        assert_eq!(
            config.ingest.endpoint,
            "https://logs.example.net/loki/api/v1/push"
        );
    }

    #[test]
    fn test_defaults_need_credentials() {
        let err = parse_config_str("{}", no_env).unwrap_err();
        let ConfigError::ValidationList(errors) = err else {
            panic!("expected validation list");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("ingest.endpoint"));
    }

    #[test]
    fn test_env_only_config_is_valid() {
        let env = |name: &str| match name {
            "LOKI_URL" => Some("http://loki:3100/loki/api/v1/push".to_string()),
            "LOKI_USER" => Some("u".to_string()),
            "LOKI_TOKEN" => Some("t".to_string()),
            _ => None,
        };
        let config = parse_config_str("{}", env).unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.ingest.max_batch_entries, 1000);
        assert!(matches!(config.storage.backend, StorageBackend::Local { .. }));
    }

    #[test]
    fn test_invalid_values_are_listed() {
        let yaml = r#"
server:
  listen: not-an-address
ingest:
  endpoint: ftp://nope
  user: u
  token: t
  max_batch_entries: 0
pipeline:
  max_in_flight: 0
"#;
        let ConfigError::ValidationList(errors) = parse_config_str(yaml, no_env).unwrap_err()
        else {
            panic!("expected validation list");
        };
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_unset_env_reference_is_reported() {
        let yaml = "ingest:\n  token: \"$env{ELB2LOKI_TEST_UNSET_TOKEN}\"\n";
        let err = parse_config_str(yaml, no_env).unwrap_err();
        assert!(err.to_string().contains("ELB2LOKI_TEST_UNSET_TOKEN"));
    }
}
