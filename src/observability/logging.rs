//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Pretty format for development, compact without colours for production
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ObservabilityConfig, RunMode};

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig, mode: RunMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "service_gateway={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if mode.is_development() {
        registry.with(fmt::layer().pretty()).try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_ansi(false))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
