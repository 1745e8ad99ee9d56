//! Telemetry publisher: the per-device transmit timer
//!
//! Runs independently of the device session it is paired with. On every
//! tick it reads the shared snapshot and, when there is data and sending is
//! enabled, hands the serialized payload to the hub sink. Delivery failures
//! are logged and the next tick proceeds regardless; there is no buffering
//! and no retry.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use tagrelay_core::Snapshot;
use tagrelay_hub::TelemetrySink;

pub struct TelemetryPublisher {
    device_name: String,
    snapshot: Snapshot,
    period: Duration,
    sink: Arc<dyn TelemetrySink>,
}

impl TelemetryPublisher {
    pub fn new(
        device_name: String,
        snapshot: Snapshot,
        period: Duration,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            device_name,
            snapshot,
            period,
            sink,
        }
    }

    /// Tick forever. Ticks fire from the moment the publisher starts,
    /// independent of whether the paired session has configured anything
    /// yet - an empty snapshot simply produces no send.
    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    async fn tick(&self) {
        let Some(payload) = self.snapshot.payload(&self.device_name) else {
            debug!(device = %self.device_name, "nothing to send");
            return;
        };
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(err) => {
                warn!(device = %self.device_name, error = %err, "payload serialization failed");
                return;
            }
        };
        info!(device = %self.device_name, bytes = body.len(), "sending payload");
        if let Err(err) = self.sink.send_event(&body).await {
            warn!(device = %self.device_name, error = %err, "delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagrelay_hub::MockSink;
    use tokio::time::sleep;

    fn spawn_publisher(snapshot: Snapshot, sink: MockSink) {
        let publisher = TelemetryPublisher::new(
            "office-tag".to_string(),
            snapshot,
            Duration::from_millis(5000),
            Arc::new(sink),
        );
        tokio::spawn(publisher.run());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_snapshot_never_sends() {
        let snapshot = Snapshot::new();
        snapshot.set_send_enabled(true);
        let sink = MockSink::new();
        spawn_publisher(snapshot, sink.clone());

        sleep(Duration::from_millis(20_000)).await;
        assert!(sink.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_snapshot_never_sends() {
        let snapshot = Snapshot::new();
        snapshot.record("Luxometer", 300.0);
        let sink = MockSink::new();
        spawn_publisher(snapshot, sink.clone());

        sleep(Duration::from_millis(20_000)).await;
        assert!(sink.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_latest_values_each_tick() {
        let snapshot = Snapshot::new();
        snapshot.set_send_enabled(true);
        snapshot.record("Luxometer", 100.0);
        let sink = MockSink::new();
        spawn_publisher(snapshot.clone(), sink.clone());

        // First tick fires immediately
        sleep(Duration::from_millis(1)).await;
        snapshot.record("Luxometer", 300.0);
        sleep(Duration::from_millis(5000)).await;

        let sent = sink.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("\"Luxometer\":100.0"));
        assert!(sent[1].contains("\"Luxometer\":300.0"));
        assert!(sent[1].contains("\"DeviceId\":\"office-tag\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_failure_does_not_stop_ticks() {
        let snapshot = Snapshot::new();
        snapshot.set_send_enabled(true);
        snapshot.record("Humidity", 122.0);
        let sink = MockSink::new();
        sink.set_failing(true);
        spawn_publisher(snapshot, sink.clone());

        sleep(Duration::from_millis(10_001)).await;
        // Immediate tick plus two periods, every attempt made despite failures
        assert_eq!(sink.sent().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_stops_when_disabled_mid_run() {
        let snapshot = Snapshot::new();
        snapshot.set_send_enabled(true);
        snapshot.record("Humidity", 122.0);
        let sink = MockSink::new();
        spawn_publisher(snapshot.clone(), sink.clone());

        sleep(Duration::from_millis(1)).await;
        assert_eq!(sink.sent().len(), 1);

        snapshot.set_send_enabled(false);
        sleep(Duration::from_millis(20_000)).await;
        // Data still present, but the gate is down
        assert_eq!(sink.sent().len(), 1);
    }
}
