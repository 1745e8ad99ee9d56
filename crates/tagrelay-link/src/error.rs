use tagrelay_core::Channel;
use thiserror::Error;

pub type Result<T, E = LinkError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LinkError {
    /// The connection and service-setup handshake failed.
    #[error("connection handshake failed: {0}")]
    Connect(String),
    /// An enable/notify/disable call for a channel failed.
    #[error("channel {channel} control failed: {reason}")]
    Channel { channel: Channel, reason: String },
    /// Driver-level I/O error outside the handshake and channel control.
    #[error("link I/O error: {0}")]
    Io(String),
}
