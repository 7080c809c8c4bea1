//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then process environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::with_task_service(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment-style overrides using the supplied lookup.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("GATEWAY_ENV") {
        config.mode = v
            .parse()
            .map_err(|reason| ConfigError::Env { var: "GATEWAY_ENV", reason })?;
    }
    if let Some(v) = lookup("GATEWAY_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("GATEWAY_PORT") {
        let port: u16 = parse_num("GATEWAY_PORT", &v)?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(v) = lookup("HEALTH_CHECK_INTERVAL") {
        config.health_check.interval_ms = parse_num("HEALTH_CHECK_INTERVAL", &v)?;
    }
    if let Some(v) = lookup("HEALTH_CHECK_TIMEOUT") {
        config.health_check.timeout_ms = parse_num("HEALTH_CHECK_TIMEOUT", &v)?;
    }
    if let Some(v) = lookup("REQUEST_TIMEOUT") {
        config.timeouts.request_ms = parse_num("REQUEST_TIMEOUT", &v)?;
    }
    if let Some(v) = lookup("LB_STRATEGY") {
        config.load_balancing.strategy = v
            .parse()
            .map_err(|reason| ConfigError::Env { var: "LB_STRATEGY", reason })?;
    }
    if let Some(v) = lookup("GATEWAY_API_KEY") {
        config.security.api_key = Some(v).filter(|k| !k.is_empty());
    }
    if let Some(v) = lookup("CLIENT_URL") {
        config.security.cors_origin = Some(v);
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = lookup("GATEWAY_SERVICES") {
        config.services = parse_services(&v)?;
    }
    Ok(())
}

fn parse_num<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        reason: e.to_string(),
    })
}

/// Parse `name=url,name=url`.
fn parse_services(value: &str) -> Result<Vec<ServiceConfig>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, url) = entry.split_once('=').ok_or_else(|| ConfigError::Env {
                var: "GATEWAY_SERVICES",
                reason: format!("expected name=url, got '{}'", entry),
            })?;
            Ok(ServiceConfig {
                name: name.trim().to_string(),
                url: url.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RunMode, Strategy};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::with_task_service();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("GATEWAY_ENV", "development"),
                ("GATEWAY_PORT", "4000"),
                ("HEALTH_CHECK_INTERVAL", "1500"),
                ("LB_STRATEGY", "random"),
                ("GATEWAY_SERVICES", "task-service=http://a:1, task-service=http://b:2"),
            ]),
        )
        .unwrap();

        assert_eq!(config.mode, RunMode::Development);
        assert_eq!(config.listener.bind_address, "0.0.0.0:4000");
        assert_eq!(config.health_check.interval_ms, 1500);
        assert_eq!(config.load_balancing.strategy, Strategy::Random);
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[1].url, "http://b:2");
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let mut config = GatewayConfig::default();
        let err = apply_env_overrides(&mut config, lookup(&[("HEALTH_CHECK_INTERVAL", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "HEALTH_CHECK_INTERVAL", .. }));

        let err = apply_env_overrides(&mut config, lookup(&[("GATEWAY_SERVICES", "no-url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "GATEWAY_SERVICES", .. }));
    }
}
