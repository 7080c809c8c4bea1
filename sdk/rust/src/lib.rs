//! Client for backends that register themselves with the service gateway.
//!
//! ```no_run
//! # async fn run() -> Result<(), gateway_sdk::SdkError> {
//! use std::time::Duration;
//! use gateway_sdk::{GatewayClient, ServiceRegistration};
//!
//! let client = GatewayClient::new("http://localhost:3000");
//! let handle = ServiceRegistration::new(client, "task-service", "http://localhost:3001")
//!     .report_every(Duration::from_secs(30))
//!     .spawn();
//! // ... serve traffic ...
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod registration;

pub use client::{GatewayClient, HealthAnswer, RegisterResponse, ReportResponse, SdkError, ServiceEntry};
pub use registration::{RegistrationHandle, ServiceRegistration};
