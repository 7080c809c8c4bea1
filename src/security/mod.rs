//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (body size, CORS)
//!     → auth.rs (guard for protected routes)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → Forwarder
//! ```
//!
//! # Design Decisions
//! - Authentication proper is an external collaborator behind `RequestGuard`
//! - Fail closed: a guard rejection never reaches a backend

pub mod auth;
pub mod headers;
pub mod limits;
