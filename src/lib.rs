//! Service gateway library.
//!
//! A single entry point in front of a set of HTTP services. Instances register
//! themselves (or come from configuration), a background monitor keeps their
//! health current, and every request that is not for the gateway itself is
//! routed by path prefix to a healthy instance of the owning service.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod registry;
pub mod routing;

// Traffic management
pub mod health;
pub mod load_balancer;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use registry::Registry;
