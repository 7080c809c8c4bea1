//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → service name identified
//!     → selector.rs (healthy snapshot from the registry, insertion order)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (per-service cursor)
//!         - random.rs (uniform index)
//!     → Return instance or NoHealthyInstance
//! ```
//!
//! # Design Decisions
//! - Strategies only choose an index; the selector owns registry access
//! - Strategy chosen once at startup from configuration
//! - Unhealthy instances excluded before the strategy sees the list

pub mod random;
pub mod round_robin;
pub mod selector;

pub use selector::Selector;

/// A selection policy over `healthy_count` candidates.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Index in `0..healthy_count`, or `None` when there is nothing to pick.
    fn pick(&self, service: &str, healthy_count: usize) -> Option<usize>;
}
