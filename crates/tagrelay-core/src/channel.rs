//! Channel registry: the sensor channels a SensorTag exposes
//!
//! Each channel carries its snapshot field names, its unit conversion, and a
//! predicate for which hardware revisions support it. Session configuration
//! iterates [`Channel::ALL`] in order, so that order determines enable/log
//! ordering.

use crate::device::HardwareVariant;
use serde::{Deserialize, Serialize};

/// Convert degrees Celsius to Fahrenheit.
pub fn to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// One physical measurement capability of a SensorTag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    IrTemperature,
    Accelerometer,
    Humidity,
    Magnetometer,
    BarometricPressure,
    Gyroscope,
    Luxometer,
}

impl Channel {
    /// All channels in configuration order.
    pub const ALL: [Channel; 7] = [
        Channel::IrTemperature,
        Channel::Accelerometer,
        Channel::Humidity,
        Channel::Magnetometer,
        Channel::BarometricPressure,
        Channel::Gyroscope,
        Channel::Luxometer,
    ];

    /// Human-readable label used in log output.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::IrTemperature => "IR temperature",
            Channel::Accelerometer => "accelerometer",
            Channel::Humidity => "humidity",
            Channel::Magnetometer => "magnetometer",
            Channel::BarometricPressure => "barometric pressure",
            Channel::Gyroscope => "gyroscope",
            Channel::Luxometer => "luxometer",
        }
    }

    /// Snapshot field names for this channel, in the order the driver
    /// reports the channel's values.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Channel::IrTemperature => &["Infrared Temperature", "Ambient Temperature"],
            Channel::Accelerometer => {
                &["Accelerometer X", "Accelerometer Y", "Accelerometer Z"]
            }
            Channel::Humidity => &["Temperature", "Humidity"],
            Channel::Magnetometer => &["Magnetometer X", "Magnetometer Y", "Magnetometer Z"],
            Channel::BarometricPressure => &["Barometric Pressure"],
            Channel::Gyroscope => &["Rotation X", "Rotation Y", "Rotation Z"],
            Channel::Luxometer => &["Luxometer"],
        }
    }

    /// Unit conversion applied to every value this channel reports.
    ///
    /// Temperature-bearing channels convert Celsius to Fahrenheit. The
    /// humidity channel runs both of its values through the conversion,
    /// including the relative-humidity percentage; downstream dashboards
    /// were built against exactly these numbers, so keep it until product
    /// signs off on a change.
    pub fn convert(&self, raw: f64) -> f64 {
        match self {
            Channel::IrTemperature | Channel::Humidity => to_fahrenheit(raw),
            _ => raw,
        }
    }

    /// Whether this channel physically exists on the given hardware revision.
    pub fn supported_by(&self, variant: &HardwareVariant) -> bool {
        match self {
            Channel::Luxometer => *variant == HardwareVariant::Cc2650,
            _ => true,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-channel enable flags.
///
/// Flags take effect for newly established sessions only; a session that has
/// already configured its device is never reconfigured live. After changing
/// which channels report, expect the hub side to take several minutes before
/// its cached schema reflects the new channel set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub ir_temperature: bool,
    #[serde(default)]
    pub accelerometer: bool,
    #[serde(default = "default_true")]
    pub humidity: bool,
    #[serde(default)]
    pub magnetometer: bool,
    #[serde(default = "default_true")]
    pub barometric_pressure: bool,
    #[serde(default)]
    pub gyroscope: bool,
    #[serde(default = "default_true")]
    pub luxometer: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            ir_temperature: false,
            accelerometer: false,
            humidity: true,
            magnetometer: false,
            barometric_pressure: true,
            gyroscope: false,
            luxometer: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl ChannelConfig {
    /// Whether configuration enables the given channel.
    pub fn is_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::IrTemperature => self.ir_temperature,
            Channel::Accelerometer => self.accelerometer,
            Channel::Humidity => self.humidity,
            Channel::Magnetometer => self.magnetometer,
            Channel::BarometricPressure => self.barometric_pressure,
            Channel::Gyroscope => self.gyroscope,
            Channel::Luxometer => self.luxometer,
        }
    }

    /// Disable every channel. Useful as a test baseline.
    pub fn all_disabled() -> Self {
        Self {
            ir_temperature: false,
            accelerometer: false,
            humidity: false,
            magnetometer: false,
            barometric_pressure: false,
            gyroscope: false,
            luxometer: false,
        }
    }
}
