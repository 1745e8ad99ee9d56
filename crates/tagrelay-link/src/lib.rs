//! tagrelay Link - the wireless driver seam
//!
//! This crate defines the boundary to the short-range wireless driver that
//! tagrelay polls SensorTag devices through: async traits for discovery,
//! connection setup, and per-channel control, plus the event stream a live
//! connection emits. The default build enables a `mock` backend so the
//! daemon and its tests compile and run on any host without a radio; a
//! native BLE backend plugs in behind the same traits.

mod error;
pub use error::{LinkError, Result};

mod traits;
pub use traits::{DeviceHandle, LinkEvent, SensorLink};

#[cfg(feature = "mock")]
pub mod mock;
