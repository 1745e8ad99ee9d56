//! Device identity types for the configured fleet

use serde::{Deserialize, Serialize};

/// Identity record for one configured device.
///
/// Loaded from configuration and immutable afterwards; owned by the fleet
/// coordinator, one per device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Stable hardware identifier (the tag's MAC address without colons)
    pub id: String,
    /// Display name, also the IoT device name registered on the hub
    pub name: String,
    /// Shared access key for the hub-side device identity
    pub key: String,
}

/// Hardware revision of a SensorTag.
///
/// Determines which sensor channels physically exist: the luxometer shipped
/// only on the CC2650 revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HardwareVariant {
    Cc2540,
    Cc2650,
    /// A revision this build does not know about; variant-gated channels are
    /// treated as absent.
    Unknown(String),
}

impl HardwareVariant {
    /// Parse the variant from the driver's hardware type string.
    pub fn from_type_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "cc2540" => Self::Cc2540,
            "cc2650" => Self::Cc2650,
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for HardwareVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cc2540 => write!(f, "cc2540"),
            Self::Cc2650 => write!(f, "cc2650"),
            Self::Unknown(s) => write!(f, "{}", s),
        }
    }
}
