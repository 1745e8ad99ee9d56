//! tagrelay Hub - the cloud messaging seam
//!
//! This crate wraps IoT Hub device-to-cloud messaging for the tagrelay
//! system: connection-string handling, the [`TelemetrySink`] trait the
//! publisher delivers through, an HTTPS implementation with shared-access
//! signature auth, and a recording mock for tests.

mod connection;
pub use connection::ConnectionString;

mod sink;
pub use sink::{HttpSink, TelemetrySink};

pub mod mock;
pub use mock::MockSink;

use thiserror::Error;

pub type Result<T, E = HubError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
    #[error("invalid shared access key: {0}")]
    InvalidKey(String),
    /// A delivery attempt failed. Never retried by this crate; callers log
    /// and move on to the next message.
    #[error("delivery failed: {0}")]
    Delivery(String),
}
