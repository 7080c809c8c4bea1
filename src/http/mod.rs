//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → services.rs (/health, /services/*)      gateway-owned paths
//!     → server.rs::proxy_handler               everything else
//!         → routing (prefix → service, path rewrite)
//!         → security::auth (protected routes)
//!         → proxy::Forwarder
//! ```

pub mod request;
pub mod server;
pub mod services;

pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayServer};
