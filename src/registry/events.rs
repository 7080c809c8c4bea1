//! Registry change notifications.
//!
//! Observers are registered on the [`Registry`](super::Registry) and invoked
//! after the write lock is released, in registration order.

use std::fmt::Debug;

use crate::observability::metrics;
use crate::registry::instance::InstanceId;

/// A state change inside the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    Registered {
        service: String,
        id: InstanceId,
        url: String,
    },
    Unregistered {
        service: String,
        id: InstanceId,
        url: String,
    },
    /// Emitted only when `healthy` actually flips.
    HealthChanged {
        service: String,
        id: InstanceId,
        url: String,
        healthy: bool,
        consecutive_failures: u32,
    },
}

/// Receives registry events. Implementations must not call back into the registry.
pub trait RegistryObserver: Send + Sync + Debug {
    fn on_event(&self, event: &RegistryEvent);
}

/// Default observer: structured logs plus the instance health gauge.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl RegistryObserver for TracingObserver {
    fn on_event(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::Registered { service, id, url } => {
                tracing::info!(service = %service, instance = %id, url = %url, "Instance registered");
                metrics::record_instance_health(service, url, true);
            }
            RegistryEvent::Unregistered { service, id, url } => {
                tracing::info!(service = %service, instance = %id, url = %url, "Instance unregistered");
                metrics::record_instance_health(service, url, false);
            }
            RegistryEvent::HealthChanged {
                service,
                id,
                url,
                healthy,
                consecutive_failures,
            } => {
                if *healthy {
                    tracing::info!(service = %service, instance = %id, url = %url, "Instance recovered");
                } else {
                    tracing::warn!(
                        service = %service,
                        instance = %id,
                        url = %url,
                        consecutive_failures,
                        "Instance marked unhealthy"
                    );
                }
                metrics::record_instance_health(service, url, *healthy);
            }
        }
    }
}
