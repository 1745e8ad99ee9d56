use crate::Result;
use async_trait::async_trait;
use tagrelay_core::{Channel, HardwareVariant};
use tokio::sync::mpsc;

/// An event emitted by a live device connection.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// A sensor channel reported new values, in the channel's field order
    /// and in the driver's native units (unconverted).
    Reading { channel: Channel, values: Vec<f64> },
    /// The device dropped the connection. No further events follow.
    Disconnected,
}

/// Entry point to the wireless driver.
#[async_trait]
pub trait SensorLink: Send + Sync {
    /// Wait until the device with the given hardware id is in range and
    /// return a handle to it.
    ///
    /// There is no timeout: this resolves only once the device has been
    /// found, and it cannot fail.
    async fn discover_by_id(&self, id: &str) -> Box<dyn DeviceHandle>;
}

/// A discovered device, exclusively owned by one session.
#[async_trait]
pub trait DeviceHandle: Send {
    /// Hardware id this handle was discovered as.
    fn id(&self) -> &str;

    /// Hardware revision, gating variant-specific channels.
    fn variant(&self) -> HardwareVariant;

    /// Perform the connection and service-setup handshake.
    ///
    /// On success the connection's event stream is handed over; readings and
    /// the eventual disconnect notification arrive there. The stream ending
    /// without an explicit [`LinkEvent::Disconnected`] must be treated as a
    /// disconnect as well.
    async fn connect_and_set_up(&mut self) -> Result<mpsc::Receiver<LinkEvent>>;

    /// Enable a sensor channel.
    async fn enable(&mut self, channel: Channel) -> Result<()>;

    /// Subscribe to change notifications for an enabled channel.
    async fn notify(&mut self, channel: Channel) -> Result<()>;

    /// Disable a sensor channel. Disabling an already-disabled channel is
    /// not an error.
    async fn disable(&mut self, channel: Channel) -> Result<()>;
}
