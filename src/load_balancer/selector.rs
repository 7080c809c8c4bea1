//! Instance selection over the registry.

use std::sync::Arc;

use crate::config::Strategy;
use crate::error::GatewayError;
use crate::load_balancer::{random::Random, round_robin::RoundRobin, LoadBalancer};
use crate::registry::{Instance, Registry};

/// Picks one healthy instance per call using the configured strategy.
#[derive(Debug)]
pub struct Selector {
    registry: Arc<Registry>,
    strategy: Box<dyn LoadBalancer>,
}

impl Selector {
    pub fn new(registry: Arc<Registry>, strategy: Strategy) -> Self {
        let strategy: Box<dyn LoadBalancer> = match strategy {
            Strategy::RoundRobin => Box::new(RoundRobin::new()),
            Strategy::Random => Box::new(Random::new()),
        };
        Self::with_balancer(registry, strategy)
    }

    pub fn with_balancer(registry: Arc<Registry>, strategy: Box<dyn LoadBalancer>) -> Self {
        Self { registry, strategy }
    }

    /// Select the next healthy instance of `service`.
    ///
    /// Unknown services and services without healthy instances fail identically.
    pub fn next(&self, service: &str) -> Result<Instance, GatewayError> {
        let mut healthy = self.registry.healthy(service);
        let index = self
            .strategy
            .pick(service, healthy.len())
            .filter(|&i| i < healthy.len())
            .ok_or_else(|| {
                tracing::debug!(service = %service, "No healthy instances found");
                GatewayError::NoHealthyInstance(service.to_string())
            })?;
        Ok(healthy.swap_remove(index))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
