//! Guard applied to protected routes before forwarding.
//!
//! Real authentication and rate limiting live outside the gateway; this is the
//! seam where they plug in. The shipped guard checks a static bearer token.

use std::fmt::Debug;

use axum::http::{header, HeaderMap};

use crate::config::SecurityConfig;
use crate::error::GatewayError;

pub trait RequestGuard: Send + Sync + Debug {
    fn check(&self, headers: &HeaderMap) -> Result<(), GatewayError>;
}

/// Lets every request through.
#[derive(Debug, Default)]
pub struct AllowAll;

impl RequestGuard for AllowAll {
    fn check(&self, _headers: &HeaderMap) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Requires `Authorization: Bearer <token>`.
#[derive(Debug)]
pub struct BearerTokenGuard {
    expected: String,
}

impl BearerTokenGuard {
    pub fn new(token: &str) -> Self {
        Self {
            expected: format!("Bearer {}", token),
        }
    }
}

impl RequestGuard for BearerTokenGuard {
    fn check(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        let supplied = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match supplied {
            Some(value) if value == self.expected => Ok(()),
            _ => Err(GatewayError::Unauthorized),
        }
    }
}

/// Guard selected by configuration.
pub fn guard_from_config(config: &SecurityConfig) -> Box<dyn RequestGuard> {
    match config.api_key.as_deref() {
        Some(key) if !key.is_empty() => Box::new(BearerTokenGuard::new(key)),
        _ => Box::new(AllowAll),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_guard() {
        let guard = BearerTokenGuard::new("s3cret");
        let mut headers = HeaderMap::new();
        assert!(matches!(guard.check(&headers), Err(GatewayError::Unauthorized)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer wrong"));
        assert!(guard.check(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(guard.check(&headers).is_ok());
    }

    #[test]
    fn test_no_key_allows_all() {
        let guard = guard_from_config(&SecurityConfig::default());
        assert!(guard.check(&HeaderMap::new()).is_ok());
    }
}
