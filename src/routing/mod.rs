//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (route lookup, longest prefix first)
//!     → matcher.rs (segment-aware prefix match)
//!     → Return: matched Route (service name + rewritten path) or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Prefix matching only; content-based routing is not supported
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{Route, Router};
