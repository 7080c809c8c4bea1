//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Check service URLs and route prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::registry::normalize_base_url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("health_check.timeout_ms ({timeout_ms}) must be below interval_ms ({interval_ms})")]
    ProbeOutlivesCycle { timeout_ms: u64, interval_ms: u64 },

    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("service '{name}' has invalid url '{url}' (absolute http:// url required)")]
    ServiceUrl { name: String, url: String },

    #[error("service entry with url '{0}' has an empty name")]
    ServiceName(String),

    #[error("route '{0}' path_prefix must start with '/'")]
    RoutePrefix(String),

    #[error("route '{0}' has an empty service name")]
    RouteService(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let hc = &config.health_check;
    if hc.interval_ms == 0 {
        errors.push(ValidationError::Zero { field: "health_check.interval_ms" });
    }
    if hc.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "health_check.timeout_ms" });
    }
    if hc.interval_ms > 0 && hc.timeout_ms >= hc.interval_ms {
        errors.push(ValidationError::ProbeOutlivesCycle {
            timeout_ms: hc.timeout_ms,
            interval_ms: hc.interval_ms,
        });
    }
    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_ms" });
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_ms" });
    }

    for service in &config.services {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::ServiceName(service.url.clone()));
        }
        if !is_http_url(&service.url) {
            errors.push(ValidationError::ServiceUrl {
                name: service.name.clone(),
                url: service.url.clone(),
            });
        }
    }

    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::RoutePrefix(route.name.clone()));
        }
        if route.service.trim().is_empty() {
            errors.push(ValidationError::RouteService(route.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Absolute plain-http URL with a host, the only kind the forwarder can reach.
pub fn is_http_url(raw: &str) -> bool {
    normalize_base_url(raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteConfig, ServiceConfig};

    #[test]
    fn test_default_task_config_is_valid() {
        assert!(validate_config(&GatewayConfig::with_task_service()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.health_check.interval_ms = 1000;
        config.health_check.timeout_ms = 1000;
        config.timeouts.request_ms = 0;
        config.services.push(ServiceConfig {
            name: "task-service".into(),
            url: "localhost:3001".into(),
        });
        config.routes.push(RouteConfig {
            name: "tasks".into(),
            path_prefix: "api/tasks".into(),
            service: "task-service".into(),
            strip_prefix: None,
            protected: false,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::RoutePrefix("tasks".into())));
        assert!(errors.contains(&ValidationError::Zero { field: "timeouts.request_ms" }));
    }

    #[test]
    fn test_tls_service_urls_are_rejected() {
        let mut config = GatewayConfig::with_task_service();
        config.services[0].url = "https://tasks.internal:3001".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ServiceUrl {
                name: "task-service".into(),
                url: "https://tasks.internal:3001".into(),
            }]
        );
        assert!(errors[0].to_string().contains("http://"));
    }
}
