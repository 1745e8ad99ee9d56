//! In-process mock driver backend
//!
//! Each mock device is a queue of scripted handles keyed by hardware id;
//! every discovery for an id pops the next handle, so reconnect cycles are
//! scripted by queueing a handle per cycle. The test (or demo harness)
//! keeps the paired [`MockRemote`] to inject readings and disconnects and
//! to observe which channel-control calls the session issued.

use crate::{DeviceHandle, LinkError, LinkEvent, Result, SensorLink};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::debug;

use tagrelay_core::{Channel, HardwareVariant};

/// A recorded channel-control call in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCall {
    Enable(Channel),
    Notify(Channel),
    Disable(Channel),
}

/// One `discover_by_id` invocation, recorded at call time.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub id: String,
    pub at: Instant,
}

/// Mock driver entry point.
#[derive(Clone)]
pub struct MockLink {
    queues: Arc<Mutex<HashMap<String, VecDeque<MockHandle>>>>,
    version: watch::Sender<u64>,
    discoveries: Arc<Mutex<Vec<Discovery>>>,
}

impl MockLink {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            version,
            discoveries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a handle to be returned by the next discovery of its id.
    pub fn add_device(&self, handle: MockHandle) {
        self.lock_queues()
            .entry(handle.id.clone())
            .or_default()
            .push_back(handle);
        self.version.send_modify(|v| *v += 1);
    }

    /// All discovery invocations so far, in call order.
    pub fn discoveries(&self) -> Vec<Discovery> {
        self.lock_discoveries().clone()
    }

    pub fn discovery_count(&self) -> usize {
        self.lock_discoveries().len()
    }

    fn lock_queues(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<MockHandle>>> {
        self.queues.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn lock_discoveries(&self) -> std::sync::MutexGuard<'_, Vec<Discovery>> {
        self.discoveries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SensorLink for MockLink {
    async fn discover_by_id(&self, id: &str) -> Box<dyn DeviceHandle> {
        self.lock_discoveries().push(Discovery {
            id: id.to_string(),
            at: Instant::now(),
        });
        let mut rx = self.version.subscribe();
        loop {
            let next = self.lock_queues().get_mut(id).and_then(VecDeque::pop_front);
            if let Some(handle) = next {
                debug!(device = %id, "mock device in range");
                return Box::new(handle);
            }
            if rx.changed().await.is_err() {
                // No one can add devices anymore; behave like a radio with
                // nothing in range and wait forever.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// A scripted device handle.
pub struct MockHandle {
    id: String,
    variant: HardwareVariant,
    fail_connect: bool,
    fail_channel: Option<Channel>,
    calls: Arc<Mutex<Vec<ChannelCall>>>,
    events: Option<mpsc::Receiver<LinkEvent>>,
}

impl MockHandle {
    /// Create a handle and the remote the test drives it with.
    pub fn new(id: &str, variant: HardwareVariant) -> (Self, MockRemote) {
        let (tx, rx) = mpsc::channel(64);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handle = Self {
            id: id.to_string(),
            variant,
            fail_connect: false,
            fail_channel: None,
            calls: calls.clone(),
            events: Some(rx),
        };
        (handle, MockRemote { events: tx, calls })
    }

    /// Make `connect_and_set_up` fail with a handshake error.
    pub fn with_connect_failure(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Make every enable/notify/disable call for the given channel fail.
    /// The failing call is still recorded, so tests can assert where the
    /// setup sequence stopped.
    pub fn with_channel_failure(mut self, channel: Channel) -> Self {
        self.fail_channel = Some(channel);
        self
    }

    fn check_channel(&self, channel: Channel) -> Result<()> {
        if self.fail_channel == Some(channel) {
            return Err(LinkError::Channel {
                channel,
                reason: "control refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceHandle for MockHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn variant(&self) -> HardwareVariant {
        self.variant.clone()
    }

    async fn connect_and_set_up(&mut self) -> Result<mpsc::Receiver<LinkEvent>> {
        if self.fail_connect {
            return Err(LinkError::Connect("handshake refused".to_string()));
        }
        self.events
            .take()
            .ok_or_else(|| LinkError::Io("connection already established".to_string()))
    }

    async fn enable(&mut self, channel: Channel) -> Result<()> {
        self.record(ChannelCall::Enable(channel));
        self.check_channel(channel)
    }

    async fn notify(&mut self, channel: Channel) -> Result<()> {
        self.record(ChannelCall::Notify(channel));
        self.check_channel(channel)
    }

    async fn disable(&mut self, channel: Channel) -> Result<()> {
        // Idempotent: disabling an already-disabled channel succeeds
        self.record(ChannelCall::Disable(channel));
        self.check_channel(channel)
    }
}

impl MockHandle {
    fn record(&self, call: ChannelCall) {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(call);
    }
}

/// Test-side controller for a [`MockHandle`].
pub struct MockRemote {
    events: mpsc::Sender<LinkEvent>,
    calls: Arc<Mutex<Vec<ChannelCall>>>,
}

impl MockRemote {
    /// Inject a sensor reading, as the driver would report it (unconverted).
    pub async fn send_reading(&self, channel: Channel, values: &[f64]) {
        let _ = self
            .events
            .send(LinkEvent::Reading {
                channel,
                values: values.to_vec(),
            })
            .await;
    }

    /// Drop the connection.
    pub async fn disconnect(&self) {
        let _ = self.events.send(LinkEvent::Disconnected).await;
    }

    /// Channel-control calls issued against the handle so far.
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_discovery_returns_queued_handle() {
        let link = MockLink::new();
        let (handle, _remote) = MockHandle::new("aabbcc", HardwareVariant::Cc2650);
        link.add_device(handle);

        let found = link.discover_by_id("aabbcc").await;
        assert_eq!(found.id(), "aabbcc");
        assert_eq!(found.variant(), HardwareVariant::Cc2650);
        assert_eq!(link.discovery_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_waits_until_device_in_range() {
        let link = MockLink::new();
        let waiter = {
            let link = link.clone();
            tokio::spawn(async move { link.discover_by_id("aabbcc").await.id().to_string() })
        };

        // Let the discovery start and sit waiting
        sleep(Duration::from_secs(60)).await;
        assert!(!waiter.is_finished());

        let (handle, _remote) = MockHandle::new("aabbcc", HardwareVariant::Cc2540);
        link.add_device(handle);
        assert_eq!(waiter.await.unwrap(), "aabbcc");
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let (mut handle, _remote) =
            MockHandle::new("aabbcc", HardwareVariant::Cc2650);
        handle = handle.with_connect_failure();
        let err = handle.connect_and_set_up().await.unwrap_err();
        assert!(matches!(err, LinkError::Connect(_)));
    }

    #[tokio::test]
    async fn test_channel_failure_switch() {
        let (handle, _remote) = MockHandle::new("aabbcc", HardwareVariant::Cc2650);
        let mut handle = handle.with_channel_failure(Channel::Humidity);
        let err = handle.enable(Channel::Humidity).await.unwrap_err();
        assert!(matches!(
            err,
            LinkError::Channel {
                channel: Channel::Humidity,
                ..
            }
        ));
        // Other channels are unaffected
        handle.enable(Channel::Luxometer).await.unwrap();
    }

    #[tokio::test]
    async fn test_disable_is_idempotent() {
        let (mut handle, remote) = MockHandle::new("aabbcc", HardwareVariant::Cc2650);
        handle.disable(Channel::Gyroscope).await.unwrap();
        // Disabling an already-disabled channel succeeds as well
        handle.disable(Channel::Gyroscope).await.unwrap();
        assert_eq!(
            remote.calls(),
            vec![
                ChannelCall::Disable(Channel::Gyroscope),
                ChannelCall::Disable(Channel::Gyroscope),
            ]
        );
    }

    #[tokio::test]
    async fn test_readings_and_disconnect_flow() {
        let (mut handle, remote) = MockHandle::new("aabbcc", HardwareVariant::Cc2650);
        let mut events = handle.connect_and_set_up().await.unwrap();

        handle.enable(Channel::Humidity).await.unwrap();
        handle.notify(Channel::Humidity).await.unwrap();
        handle.disable(Channel::Gyroscope).await.unwrap();
        assert_eq!(
            remote.calls(),
            vec![
                ChannelCall::Enable(Channel::Humidity),
                ChannelCall::Notify(Channel::Humidity),
                ChannelCall::Disable(Channel::Gyroscope),
            ]
        );

        remote.send_reading(Channel::Humidity, &[20.0, 50.0]).await;
        remote.disconnect().await;

        match events.recv().await.unwrap() {
            LinkEvent::Reading { channel, values } => {
                assert_eq!(channel, Channel::Humidity);
                assert_eq!(values, vec![20.0, 50.0]);
            }
            other => panic!("expected reading, got {:?}", other),
        }
        assert!(matches!(events.recv().await.unwrap(), LinkEvent::Disconnected));
    }
}
