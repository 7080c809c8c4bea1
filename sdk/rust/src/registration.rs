//! Background self-registration.
//!
//! Registration is retried until the gateway accepts it; afterwards the task
//! pushes a `healthy` report for this instance on every tick. Stopping the
//! handle unregisters the instance.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::GatewayClient;

const DEFAULT_RETRY: Duration = Duration::from_secs(5);
const DEFAULT_REPORT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    client: GatewayClient,
    name: String,
    url: String,
    retry_every: Duration,
    report_every: Duration,
}

impl ServiceRegistration {
    pub fn new(client: GatewayClient, name: &str, url: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
            url: url.to_string(),
            retry_every: DEFAULT_RETRY,
            report_every: DEFAULT_REPORT,
        }
    }

    pub fn retry_every(mut self, every: Duration) -> Self {
        self.retry_every = every;
        self
    }

    pub fn report_every(mut self, every: Duration) -> Self {
        self.report_every = every;
        self
    }

    pub fn spawn(self) -> RegistrationHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (id_tx, id_rx) = watch::channel(None);
        let task = tokio::spawn(self.run(stop_rx, id_tx));
        RegistrationHandle {
            stop: stop_tx,
            id: id_rx,
            task,
        }
    }

    async fn run(self, mut stop: watch::Receiver<bool>, id_tx: watch::Sender<Option<String>>) {
        let id = loop {
            match self.client.register(&self.name, &self.url).await {
                Ok(registered) => {
                    tracing::info!(service = %self.name, id = %registered.id, "Registered with gateway");
                    break registered.id;
                }
                Err(e) => {
                    tracing::warn!(
                        service = %self.name,
                        error = %e,
                        retry_in = ?self.retry_every,
                        "Gateway registration failed"
                    );
                }
            }
            tokio::select! {
                _ = tokio::time::sleep(self.retry_every) => {}
                _ = stop.changed() => return,
            }
        };
        let _ = id_tx.send(Some(id.clone()));

        let mut ticker = tokio::time::interval(self.report_every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.client.report_health(&self.name, "healthy", Some(&self.url)).await {
                        tracing::warn!(service = %self.name, error = %e, "Health report failed");
                    }
                }
                _ = stop.changed() => break,
            }
        }

        if let Err(e) = self.client.unregister(&self.name, &id).await {
            tracing::warn!(service = %self.name, error = %e, "Unregistration failed");
        }
    }
}

/// Controls a running [`ServiceRegistration`].
#[derive(Debug)]
pub struct RegistrationHandle {
    stop: watch::Sender<bool>,
    id: watch::Receiver<Option<String>>,
    task: JoinHandle<()>,
}

impl RegistrationHandle {
    /// The instance id, once the gateway has accepted the registration.
    pub fn id(&self) -> Option<String> {
        self.id.borrow().clone()
    }

    /// Wait until registration succeeds. `None` if the task ended first.
    pub async fn registered(&mut self) -> Option<String> {
        match self.id.wait_for(Option::is_some).await {
            Ok(id) => id.clone(),
            Err(_) => None,
        }
    }

    /// Stop reporting, unregister, and wait for the task to finish.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
