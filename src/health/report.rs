//! Push-based health reports.
//!
//! An instance may report its own state instead of waiting to be probed.
//! A report marks the instance as freshly checked so the next probe cycle skips it.

use std::time::SystemTime;

use serde::Deserialize;

use crate::error::GatewayError;
use crate::registry::Registry;

/// Body of `POST /services/health/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    /// Restricts the report to one instance; otherwise the whole group is updated.
    #[serde(default)]
    pub url: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        let status = self.status.trim();
        ["healthy", "ok", "up"]
            .iter()
            .any(|s| status.eq_ignore_ascii_case(s))
    }
}

/// Apply a report. Returns the number of instances updated.
pub fn apply_report(
    registry: &Registry,
    service: &str,
    report: &HealthReport,
) -> Result<usize, GatewayError> {
    let group = registry
        .get(service)
        .ok_or_else(|| GatewayError::UnknownService(service.to_string()))?;

    let healthy = report.is_healthy();
    let now = SystemTime::now();

    let targets: Vec<_> = match report.url.as_deref() {
        Some(url) => group.find_by_url(url).into_iter().collect(),
        None => group.instances.iter().collect(),
    };

    let updated = targets
        .into_iter()
        .filter(|instance| registry.record_report(service, instance.id, healthy, now))
        .count();

    tracing::debug!(service = %service, healthy, updated, "Health report applied");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: &str, url: Option<&str>) -> HealthReport {
        HealthReport {
            status: status.to_string(),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn test_status_words() {
        assert!(report("healthy", None).is_healthy());
        assert!(report("UP", None).is_healthy());
        assert!(!report("degraded", None).is_healthy());
    }

    #[test]
    fn test_report_targets_one_instance_by_url() {
        let registry = Registry::new();
        registry.register("task-service", "http://a:1").unwrap();
        registry.register("task-service", "http://b:1").unwrap();

        let updated = apply_report(&registry, "task-service", &report("down", Some("http://b:1/"))).unwrap();
        assert_eq!(updated, 1);

        let group = registry.get("task-service").unwrap();
        assert!(group.instances[0].healthy);
        assert!(!group.instances[1].healthy);
        assert!(group.instances[1].reported_at.is_some());
    }

    #[test]
    fn test_report_without_url_updates_group() {
        let registry = Registry::new();
        registry.register("task-service", "http://a:1").unwrap();
        registry.register("task-service", "http://b:1").unwrap();

        assert_eq!(apply_report(&registry, "task-service", &report("down", None)).unwrap(), 2);
        assert!(registry.healthy("task-service").is_empty());
    }

    #[test]
    fn test_unknown_service() {
        let registry = Registry::new();
        assert!(matches!(
            apply_report(&registry, "ghost", &report("healthy", None)),
            Err(GatewayError::UnknownService(_))
        ));
    }
}
