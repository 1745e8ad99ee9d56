//! Fleet coordinator: one session + publisher pair per configured device
//!
//! Devices are fully independent: a session mid-reconnection does not pause
//! its publisher (it simply has nothing to send while disabled), and a
//! fatal connection error on one device leaves every other device running.
//! Intentionally minimal - no restart-storm protection, no backoff growth,
//! no health reporting; those are left to the operator.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

use tagrelay_core::{DeviceDescriptor, Snapshot};
use tagrelay_hub::TelemetrySink;
use tagrelay_link::SensorLink;

use crate::config::Config;
use crate::publisher::TelemetryPublisher;
use crate::session::DeviceSession;

pub struct FleetCoordinator {
    config: Config,
}

impl FleetCoordinator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start every device's session and publisher and supervise them.
    ///
    /// `make_sink` builds the hub sink for one device. The returned future
    /// resolves only if every task has ended, which in practice is never:
    /// publishers tick forever and healthy sessions reconnect forever.
    pub async fn run<F>(self, link: Arc<dyn SensorLink>, make_sink: F)
    where
        F: Fn(&DeviceDescriptor) -> Arc<dyn TelemetrySink>,
    {
        let period = Duration::from_millis(self.config.relay.transmit_interval_ms);
        let backoff = Duration::from_millis(self.config.relay.retry_backoff_ms);
        let mut tasks = JoinSet::new();

        for descriptor in &self.config.devices {
            let snapshot = Snapshot::new();
            let session = DeviceSession::new(
                descriptor.clone(),
                self.config.channels.clone(),
                snapshot.clone(),
                backoff,
            );
            let publisher = TelemetryPublisher::new(
                descriptor.name.clone(),
                snapshot,
                period,
                make_sink(descriptor),
            );

            info!(device = %descriptor.id, name = %descriptor.name, "starting device");
            let link = link.clone();
            let name = descriptor.name.clone();
            tasks.spawn(async move {
                if let Err(err) = session.run(link).await {
                    // Fatal for this device only; its publisher keeps ticking
                    // but the snapshot stays gated off.
                    error!(device = %name, error = %err, "session failed, device left offline");
                }
            });
            tasks.spawn(publisher.run());
        }

        while tasks.join_next().await.is_some() {}
    }
}
