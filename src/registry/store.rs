//! Service registry.
//!
//! # Responsibilities
//! - Own the name → ordered instance list mapping
//! - Enforce url-uniqueness within a group and insertion order
//! - Hand out immutable snapshots to readers
//! - Notify observers of membership and health transitions

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use serde::Serialize;

use crate::error::GatewayError;
use crate::registry::events::{RegistryEvent, RegistryObserver};
use crate::registry::instance::{normalize_base_url, Instance, InstanceId};

/// Immutable copy of one service group.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceGroup {
    pub name: String,
    pub instances: Vec<Instance>,
}

impl ServiceGroup {
    /// Healthy instances in insertion order.
    pub fn healthy(&self) -> Vec<Instance> {
        self.instances.iter().filter(|i| i.healthy).cloned().collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.instances.iter().any(|i| i.healthy)
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Instance> {
        let normalized = normalize_base_url(url).ok()?;
        self.instances.iter().find(|i| i.base_url == normalized)
    }
}

/// Process-wide registry of backend instances, guarded by a single lock.
#[derive(Debug, Default)]
pub struct Registry {
    groups: RwLock<BTreeMap<String, Vec<Instance>>>,
    observers: RwLock<Vec<Arc<dyn RegistryObserver>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer; it receives every subsequent event.
    pub fn subscribe(&self, observer: Arc<dyn RegistryObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Register `url` under `service`. Re-registering the same url returns the existing id.
    pub fn register(&self, service: &str, url: &str) -> Result<InstanceId, GatewayError> {
        let service = service.trim();
        if service.is_empty() {
            return Err(GatewayError::MissingField("name"));
        }
        if url.trim().is_empty() {
            return Err(GatewayError::MissingField("url"));
        }
        let base_url = normalize_base_url(url)
            .map_err(|e| GatewayError::InvalidUrl(format!("{}: {}", url, e)))?;

        let (id, event) = {
            let mut groups = self.write();
            let group = groups.entry(service.to_string()).or_default();
            if let Some(existing) = group.iter().find(|i| i.base_url == base_url) {
                tracing::debug!(service = %service, instance = %existing.id, "Instance already registered");
                return Ok(existing.id);
            }
            let instance = Instance::new(base_url, SystemTime::now());
            let event = RegistryEvent::Registered {
                service: service.to_string(),
                id: instance.id,
                url: instance.base_url.clone(),
            };
            let id = instance.id;
            group.push(instance);
            (id, event)
        };

        self.emit(&[event]);
        Ok(id)
    }

    /// Remove an instance. Absent service or id is a no-op; returns whether anything was removed.
    pub fn unregister(&self, service: &str, id: InstanceId) -> bool {
        let removed = {
            let mut groups = self.write();
            groups.get_mut(service).and_then(|group| {
                let pos = group.iter().position(|i| i.id == id)?;
                Some(group.remove(pos))
            })
        };

        match removed {
            Some(instance) => {
                self.emit(&[RegistryEvent::Unregistered {
                    service: service.to_string(),
                    id,
                    url: instance.base_url,
                }]);
                true
            }
            None => false,
        }
    }

    /// Snapshot of one group.
    pub fn get(&self, service: &str) -> Option<ServiceGroup> {
        self.read().get(service).map(|instances| ServiceGroup {
            name: service.to_string(),
            instances: instances.clone(),
        })
    }

    /// Healthy instances of `service` in insertion order; empty if unknown.
    pub fn healthy(&self, service: &str) -> Vec<Instance> {
        self.read()
            .get(service)
            .map(|instances| instances.iter().filter(|i| i.healthy).cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, service: &str) -> bool {
        self.read().contains_key(service)
    }

    /// Snapshot of every group, ordered by service name.
    pub fn list_all(&self) -> BTreeMap<String, ServiceGroup> {
        self.read()
            .iter()
            .map(|(name, instances)| {
                (
                    name.clone(),
                    ServiceGroup {
                        name: name.clone(),
                        instances: instances.clone(),
                    },
                )
            })
            .collect()
    }

    /// Flattened `(service, instance)` pairs, used by the probe cycle.
    pub fn instances(&self) -> Vec<(String, Instance)> {
        self.read()
            .iter()
            .flat_map(|(name, instances)| instances.iter().map(move |i| (name.clone(), i.clone())))
            .collect()
    }

    /// Unconditional health write. Unknown service or id is silently ignored.
    pub fn set_health(&self, service: &str, id: InstanceId, healthy: bool, at: SystemTime) -> bool {
        self.apply_health(service, id, healthy, at, HealthSource::Direct)
    }

    /// The monitor's write path for a probe that began at `started`. Dropped when
    /// the instance pushed a report after that, so a slow probe never overwrites it.
    pub fn record_probe(
        &self,
        service: &str,
        id: InstanceId,
        healthy: bool,
        started: SystemTime,
        at: SystemTime,
    ) -> bool {
        self.apply_health(service, id, healthy, at, HealthSource::Probe { started })
    }

    /// Same as [`set_health`](Self::set_health) but also stamps the instance as self-reported.
    pub fn record_report(&self, service: &str, id: InstanceId, healthy: bool, at: SystemTime) -> bool {
        self.apply_health(service, id, healthy, at, HealthSource::Report)
    }

    fn apply_health(
        &self,
        service: &str,
        id: InstanceId,
        healthy: bool,
        at: SystemTime,
        source: HealthSource,
    ) -> bool {
        let event = {
            let mut groups = self.write();
            let Some(instance) = groups
                .get_mut(service)
                .and_then(|group| group.iter_mut().find(|i| i.id == id))
            else {
                tracing::debug!(service = %service, instance = %id, "Health update for unknown instance ignored");
                return false;
            };

            if let HealthSource::Probe { started } = source {
                if instance.reported_at.is_some_and(|reported| reported > started) {
                    tracing::debug!(service = %service, instance = %id, "Probe result superseded by push report");
                    return false;
                }
            }

            let was_healthy = instance.healthy;
            instance.healthy = healthy;
            instance.last_checked_at = at;
            if healthy {
                instance.consecutive_failures = 0;
            } else {
                instance.consecutive_failures = instance.consecutive_failures.saturating_add(1);
            }
            if matches!(source, HealthSource::Report) {
                instance.reported_at = Some(at);
            }

            (was_healthy != healthy).then(|| RegistryEvent::HealthChanged {
                service: service.to_string(),
                id,
                url: instance.base_url.clone(),
                healthy,
                consecutive_failures: instance.consecutive_failures,
            })
        };

        if let Some(event) = event {
            self.emit(&[event]);
        }
        true
    }

    fn emit(&self, events: &[RegistryEvent]) {
        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for event in events {
            for observer in &observers {
                observer.on_event(event);
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<Instance>>> {
        self.groups.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<Instance>>> {
        self.groups.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy)]
enum HealthSource {
    Direct,
    Probe { started: SystemTime },
    Report,
}
