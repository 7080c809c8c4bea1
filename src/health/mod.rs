//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (monitor.rs):
//!     Periodic timer
//!     → Probe each instance concurrently (probe.rs)
//!     → Registry::set_health
//!
//! Push reports (report.rs):
//!     POST /services/health/{name}
//!     → Registry::record_report
//!     → Next cycle skips the freshly reported instance
//! ```
//!
//! # Design Decisions
//! - A failed probe is an observation, never an error that escapes the monitor
//! - One slow instance cannot delay the others in a cycle
//! - Cycles never overlap; the loop stops on the shutdown broadcast

pub mod monitor;
pub mod probe;
pub mod report;

pub use monitor::{CycleSummary, HealthMonitor};
pub use probe::{ProbeFailure, Prober};
pub use report::{apply_report, HealthReport};
