//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup config / POST /services/register
//!     → store.rs (register, url-dedup, insertion order)
//!
//! Health monitor / POST /services/health/{name}
//!     → store.rs (set_health / record_report)
//!     → events.rs (observers notified on transitions)
//!
//! Selector / introspection endpoints
//!     → store.rs (immutable snapshots)
//! ```
//!
//! # Design Decisions
//! - One RwLock over the whole map; the registry is small and rarely written
//! - Readers only ever receive cloned snapshots
//! - Writes against vanished instances are silent no-ops

pub mod events;
pub mod instance;
pub mod store;

pub use events::{RegistryEvent, RegistryObserver, TracingObserver};
pub use instance::{normalize_base_url, BaseUrlError, Instance, InstanceId};
pub use store::{Registry, ServiceGroup};
