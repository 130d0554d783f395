//! Registration lifecycle: register once, heartbeat until shutdown, then
//! deregister within a bounded wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{Registry, RegistryError, ServiceInstance};

/// Default heartbeat period.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound on the deregistration round trip.
pub const DEREGISTER_TIMEOUT: Duration = Duration::from_secs(2);

/// A live registration. Dropping it without calling
/// [`Registration::deregister`] stops the heartbeat and leaves the registry
/// to expire the instance.
pub struct Registration {
    registry: Arc<dyn Registry>,
    instance: ServiceInstance,
    cancel: CancellationToken,
    heartbeat: JoinHandle<()>,
}

impl Registration {
    /// Registers `instance` and starts a heartbeat reporting it healthy every
    /// `interval`.
    ///
    /// # Errors
    ///
    /// Returns the registry error if the initial registration fails.
    pub async fn start(
        registry: Arc<dyn Registry>,
        instance: ServiceInstance,
        interval: Duration,
    ) -> Result<Self, RegistryError> {
        registry.register(&instance).await?;
        info!(
            instance_id = %instance.instance_id,
            service = %instance.service_name,
            address = %instance.address,
            "registered service instance"
        );

        let cancel = CancellationToken::new();
        let heartbeat = tokio::spawn(heartbeat(
            Arc::clone(&registry),
            instance.instance_id.clone(),
            interval,
            cancel.clone(),
        ));

        Ok(Self {
            registry,
            instance,
            cancel,
            heartbeat,
        })
    }

    /// The registered instance.
    #[must_use]
    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    /// Stops the heartbeat and deregisters. Failures and timeouts are
    /// logged; this never returns an error. Stopping the heartbeat and the
    /// deregistration round trip are each bounded by `timeout`.
    pub async fn deregister(mut self, timeout: Duration) {
        self.cancel.cancel();
        match tokio::time::timeout(timeout, &mut self.heartbeat).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "heartbeat task ended abnormally"),
            Err(_) => {
                warn!("heartbeat did not stop in time, aborting it");
                self.heartbeat.abort();
            }
        }

        let instance_id = &self.instance.instance_id;
        match tokio::time::timeout(timeout, self.registry.deregister(instance_id)).await {
            Ok(Ok(())) => info!(instance_id = %instance_id, "deregistered service instance"),
            Ok(Err(e)) => warn!(instance_id = %instance_id, error = %e, "deregistration failed"),
            Err(_) => warn!(
                instance_id = %instance_id,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "deregistration timed out"
            ),
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn heartbeat(
    registry: Arc<dyn Registry>,
    instance_id: String,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and registration already
    // reported the instance healthy.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    result = registry.health_check(&instance_id) => {
                        if let Err(e) = result {
                            warn!(instance_id = %instance_id, error = %e, "health check failed");
                        }
                    }
                }
            }
        }
    }
    debug!(instance_id = %instance_id, "heartbeat stopped");
}
