//! Single-instance health probe.
//!
//! # Responsibilities
//! - Issue one bounded GET against an instance's health path
//! - Apply the body policy: 2xx and a `status` of "ok" or "UP"
//! - Classify every failure instead of returning an error

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::HealthCheckConfig;
use crate::registry::Instance;

/// Why a probe counted as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("non-success status {0}")]
    Status(u16),

    #[error("status field reports '{0}'")]
    NotUp(String),

    #[error("malformed health body: {0}")]
    MalformedBody(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connect(String),
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: Option<String>,
}

/// Accepts both backend conventions (`{"status":"ok"}` and `{"status":"UP"}`), any case.
pub fn status_is_up(status: &str) -> bool {
    let status = status.trim();
    status.eq_ignore_ascii_case("ok") || status.eq_ignore_ascii_case("up")
}

/// Performs health probes with a shared HTTP client.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    path: String,
    timeout: Duration,
}

impl Prober {
    pub fn new(config: &HealthCheckConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("service-gateway-health-check")
            .no_proxy()
            .build()
            .unwrap_or_default();

        Self {
            client,
            path: config.path.clone(),
            timeout: config.timeout(),
        }
    }

    /// Probe one instance. `Ok` means up; transport and body problems come back as a classified failure.
    pub async fn probe(&self, instance: &Instance) -> Result<(), ProbeFailure> {
        let url = instance.url_for(&self.path);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Status(status.as_u16()));
        }

        let body: HealthBody = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ProbeFailure::Timeout(self.timeout)
            } else {
                ProbeFailure::MalformedBody(e.to_string())
            }
        })?;

        match body.status {
            Some(s) if status_is_up(&s) => Ok(()),
            Some(s) => Err(ProbeFailure::NotUp(s)),
            None => Err(ProbeFailure::MalformedBody("missing status field".to_string())),
        }
    }

    fn classify(&self, error: reqwest::Error) -> ProbeFailure {
        if error.is_timeout() {
            ProbeFailure::Timeout(self.timeout)
        } else {
            ProbeFailure::Connect(error.to_string())
        }
    }
}
