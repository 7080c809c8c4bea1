//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered instance
//! - Update registry health state based on results
//! - Probe a single service on demand

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::probe::Prober;
use crate::observability::metrics;
use crate::registry::{Instance, Registry};

/// Outcome counts for one probe cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub probed: usize,
    pub healthy: usize,
    /// Instances skipped because they pushed a report within the last interval.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct HealthMonitor {
    registry: Arc<Registry>,
    prober: Prober,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Arc<Registry>, config: &HealthCheckConfig) -> Self {
        Self {
            registry,
            prober: Prober::new(config),
            interval: config.interval(),
        }
    }

    /// Run the probe loop on its own task until `shutdown` fires.
    pub fn spawn(&self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.run(shutdown).await })
    }

    /// Probe loop. A cycle runs to completion before the next tick is taken,
    /// so cycles never overlap; ticks missed meanwhile are skipped.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Health monitor starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        summary = self.run_cycle() => {
                            tracing::debug!(
                                probed = summary.probed,
                                healthy = summary.healthy,
                                skipped = summary.skipped,
                                "Health cycle complete"
                            );
                        }
                        _ = shutdown.recv() => break,
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Health monitor stopped");
    }

    /// Probe every registered instance concurrently and record the results.
    pub async fn run_cycle(&self) -> CycleSummary {
        let now = SystemTime::now();
        let (fresh, due): (Vec<_>, Vec<_>) = self
            .registry
            .instances()
            .into_iter()
            .partition(|(_, instance)| instance.reported_within(self.interval, now));

        let results = join_all(
            due.iter()
                .map(|(service, instance)| self.check(service, instance)),
        )
        .await;

        CycleSummary {
            probed: results.len(),
            healthy: results.iter().filter(|up| **up).count(),
            skipped: fresh.len(),
        }
    }

    /// Probe every instance of `service` now. `None` if the service is unknown.
    pub async fn probe_service(&self, service: &str) -> Option<bool> {
        let group = self.registry.get(service)?;
        let results = join_all(
            group
                .instances
                .iter()
                .map(|instance| self.check(service, instance)),
        )
        .await;
        Some(results.into_iter().any(|up| up))
    }

    async fn check(&self, service: &str, instance: &Instance) -> bool {
        let started = SystemTime::now();
        let healthy = match self.prober.probe(instance).await {
            Ok(()) => true,
            Err(failure) => {
                tracing::warn!(
                    service = %service,
                    instance = %instance.id,
                    url = %instance.base_url,
                    reason = %failure,
                    "Health check failed"
                );
                metrics::record_probe_failure(service);
                false
            }
        };

        self.registry
            .record_probe(service, instance.id, healthy, started, SystemTime::now());
        healthy
    }
}
