//! Request limits and cross-origin policy.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//! - Allow credentialed CORS requests from the configured client origin
//!
//! # Design Decisions
//! - Oversized bodies are rejected with 413 before reaching the forwarder
//! - An unparseable origin disables CORS rather than allowing any origin

use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::config::SecurityConfig;

pub fn body_limit_layer(config: &SecurityConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_size)
}

pub fn cors_layer(config: &SecurityConfig) -> Option<CorsLayer> {
    let origin = config.cors_origin.as_deref()?;
    let origin = match HeaderValue::from_str(origin) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid CORS origin, CORS disabled");
            return None;
        }
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_requires_valid_origin() {
        let mut config = SecurityConfig::default();
        assert!(cors_layer(&config).is_some());

        config.cors_origin = Some("bad\norigin".into());
        assert!(cors_layer(&config).is_none());

        config.cors_origin = None;
        assert!(cors_layer(&config).is_none());
    }
}
