//! tagrelay Core - shared types for the SensorTag telemetry relay
//!
//! This crate provides the foundational types for the tagrelay system:
//! - Channel registry: which sensor channels exist, their snapshot field
//!   names, unit conversions, and hardware-variant gating
//! - Device descriptors for the configured fleet
//! - The per-device telemetry snapshot shared between a device session and
//!   its publisher

pub mod channel;
pub mod device;
pub mod snapshot;

pub use channel::{to_fahrenheit, Channel, ChannelConfig};
pub use device::{DeviceDescriptor, HardwareVariant};
pub use snapshot::Snapshot;
