//! Device session: the connect/configure/listen/retry cycle for one device
//!
//! The session owns its device's connection lifecycle as an explicit state
//! machine driven by a retry loop:
//!
//! `Discovering -> Connecting -> Configuring -> Active -> (disconnect) ->
//! Discovering`
//!
//! Discovery waits indefinitely. A handshake failure is fatal to the
//! session and propagates to the fleet coordinator; a disconnect is not -
//! the session disables publishing, waits the configured backoff, and goes
//! back to discovering, indefinitely.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tagrelay_core::{Channel, ChannelConfig, DeviceDescriptor, Snapshot};
use tagrelay_link::{DeviceHandle, LinkError, LinkEvent, SensorLink};

/// Lifecycle state of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Discovering,
    Connecting,
    Configuring,
    Active,
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection handshake failed. Fatal for this device's session;
    /// there is no automatic retry at this step.
    #[error("connection failed: {0}")]
    Connect(#[source] LinkError),
    /// A channel enable/notify/disable call failed. Aborts the remaining
    /// channel setup for this device.
    #[error("configuring {channel} failed: {source}")]
    ChannelConfig {
        channel: Channel,
        #[source]
        source: LinkError,
    },
}

/// One device's session. Created by the fleet coordinator together with the
/// snapshot it shares with the device's publisher.
pub struct DeviceSession {
    descriptor: DeviceDescriptor,
    channels: ChannelConfig,
    snapshot: Snapshot,
    retry_backoff: Duration,
    state: SessionState,
}

impl DeviceSession {
    pub fn new(
        descriptor: DeviceDescriptor,
        channels: ChannelConfig,
        snapshot: Snapshot,
        retry_backoff: Duration,
    ) -> Self {
        Self {
            descriptor,
            channels,
            snapshot,
            retry_backoff,
            state: SessionState::Discovering,
        }
    }

    fn enter(&mut self, state: SessionState) {
        debug!(device = %self.descriptor.id, from = ?self.state, to = ?state, "state transition");
        self.state = state;
    }

    /// Drive the session until a fatal error.
    ///
    /// Returns only on [`SessionError`]; the disconnect/rediscover cycle
    /// loops forever otherwise.
    pub async fn run(mut self, link: Arc<dyn SensorLink>) -> Result<(), SessionError> {
        loop {
            info!(device = %self.descriptor.id, "discovering device");
            let mut handle = link.discover_by_id(&self.descriptor.id).await;
            info!(device = %handle.id(), variant = %handle.variant(), "found device");

            self.enter(SessionState::Connecting);
            info!(device = %self.descriptor.id, "connecting");
            let mut events = handle
                .connect_and_set_up()
                .await
                .map_err(SessionError::Connect)?;

            self.enter(SessionState::Configuring);
            self.configure(handle.as_mut()).await?;

            self.enter(SessionState::Active);
            self.snapshot.set_send_enabled(true);
            info!(device = %self.descriptor.id, "session active");
            self.listen(&mut events).await;

            // Disconnected: stop publishing stale data immediately, keep the
            // snapshot contents, and rediscover after the backoff.
            self.snapshot.set_send_enabled(false);
            warn!(
                device = %self.descriptor.id,
                backoff_ms = self.retry_backoff.as_millis() as u64,
                "device disconnected, scheduling rediscovery"
            );
            tokio::time::sleep(self.retry_backoff).await;
            self.enter(SessionState::Discovering);
        }
    }

    /// Issue the channel setup sequence, strictly in channel order and one
    /// call at a time - the link cannot pipeline setup commands.
    async fn configure(&self, handle: &mut dyn DeviceHandle) -> Result<(), SessionError> {
        let variant = handle.variant();
        for channel in Channel::ALL {
            if self.channels.is_enabled(channel) && channel.supported_by(&variant) {
                info!(device = %self.descriptor.id, %channel, "enabling channel");
                handle
                    .enable(channel)
                    .await
                    .map_err(|source| SessionError::ChannelConfig { channel, source })?;
                handle
                    .notify(channel)
                    .await
                    .map_err(|source| SessionError::ChannelConfig { channel, source })?;
            } else {
                handle
                    .disable(channel)
                    .await
                    .map_err(|source| SessionError::ChannelConfig { channel, source })?;
            }
        }
        Ok(())
    }

    /// Consume link events until the device disconnects. A closed event
    /// stream counts as a disconnect.
    async fn listen(&self, events: &mut mpsc::Receiver<LinkEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                LinkEvent::Reading { channel, values } => {
                    for (field, raw) in channel.fields().iter().copied().zip(values) {
                        let value = channel.convert(raw);
                        debug!(device = %self.descriptor.id, field, value, "reading");
                        self.snapshot.record(field, value);
                    }
                }
                LinkEvent::Disconnected => return,
            }
        }
    }
}
