//! Backend instance abstraction.
//!
//! # Responsibilities
//! - Represent a single backend process behind a base URL
//! - Carry the health state written by the monitor or by push reports
//! - Serialize into the introspection shape

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};
use url::Url;
use uuid::Uuid;

/// Opaque instance identifier, stable for the instance's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for InstanceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Serialize for InstanceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// A single backend instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: InstanceId,
    /// Normalized base URL without a trailing slash.
    #[serde(rename = "url")]
    pub base_url: String,
    #[serde(rename = "isHealthy")]
    pub healthy: bool,
    #[serde(rename = "lastHealthCheck", serialize_with = "serialize_epoch_millis")]
    pub last_checked_at: SystemTime,
    pub consecutive_failures: u32,
    /// When the instance last pushed its own health report.
    #[serde(skip)]
    pub reported_at: Option<SystemTime>,
}

impl Instance {
    pub(crate) fn new(base_url: String, now: SystemTime) -> Self {
        Self {
            id: InstanceId::new(),
            base_url,
            healthy: true,
            last_checked_at: now,
            consecutive_failures: 0,
            reported_at: None,
        }
    }

    /// Join the base URL with an absolute path (`/health`, `/tasks/1?x=y`).
    pub fn url_for(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base_url, path_and_query)
        } else {
            format!("{}/{}", self.base_url, path_and_query)
        }
    }

    /// True if a push report arrived within `window` of `now`.
    pub fn reported_within(&self, window: Duration, now: SystemTime) -> bool {
        self.reported_at
            .and_then(|at| now.duration_since(at).ok())
            .map(|age| age < window)
            .unwrap_or(false)
    }
}

/// Why a base URL was refused.
#[derive(Debug, thiserror::Error)]
pub enum BaseUrlError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    /// The forwarder speaks plain HTTP only; TLS is terminated in front of instances.
    #[error("unsupported scheme '{0}', only http instances can be forwarded to")]
    UnsupportedScheme(String),
}

/// Parse and normalize a base URL for duplicate detection and path joining.
pub fn normalize_base_url(raw: &str) -> Result<String, BaseUrlError> {
    let parsed = Url::parse(raw.trim())?;
    if parsed.scheme() != "http" {
        return Err(BaseUrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }
    if parsed.host().is_none() {
        return Err(url::ParseError::EmptyHost.into());
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

pub fn epoch_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn serialize_epoch_millis<S: Serializer>(at: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(epoch_millis(*at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:3001").unwrap(), "http://localhost:3001");
        assert_eq!(normalize_base_url("http://localhost:3001/").unwrap(), "http://localhost:3001");
        assert_eq!(normalize_base_url("HTTP://Example.com/v1/").unwrap(), "http://example.com/v1");
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_only_plain_http_is_accepted() {
        for raw in ["https://127.0.0.1:9", "ftp://files.local", "ws://a:1"] {
            let err = normalize_base_url(raw).unwrap_err();
            assert!(matches!(err, BaseUrlError::UnsupportedScheme(_)), "{}", raw);
            assert!(err.to_string().contains("only http"));
        }
    }

    #[test]
    fn test_url_for() {
        let instance = Instance::new("http://10.0.0.1:3001".into(), SystemTime::now());
        assert_eq!(instance.url_for("/health"), "http://10.0.0.1:3001/health");
        assert_eq!(instance.url_for("tasks?page=2"), "http://10.0.0.1:3001/tasks?page=2");
    }

    #[test]
    fn test_serialized_shape() {
        let instance = Instance::new("http://a:1".into(), UNIX_EPOCH + Duration::from_millis(1234));
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["url"], "http://a:1");
        assert_eq!(json["isHealthy"], true);
        assert_eq!(json["lastHealthCheck"], 1234);
        assert_eq!(json["consecutiveFailures"], 0);
        assert!(json.get("reportedAt").is_none());
    }
}
