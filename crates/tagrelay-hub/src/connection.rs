//! IoT Hub device connection strings

use crate::HubError;
use std::fmt;
use std::str::FromStr;

const HOST_SUFFIX: &str = ".azure-devices.net";

/// Credential for one hub-side device identity.
///
/// Round-trips through the canonical
/// `HostName=<hub>.azure-devices.net;DeviceId=<name>;SharedAccessKey=<key>`
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub hub_name: String,
    pub device_id: String,
    pub shared_access_key: String,
}

impl ConnectionString {
    pub fn new(hub_name: &str, device_id: &str, shared_access_key: &str) -> Self {
        Self {
            hub_name: hub_name.to_string(),
            device_id: device_id.to_string(),
            shared_access_key: shared_access_key.to_string(),
        }
    }

    /// Fully qualified hub hostname.
    pub fn hostname(&self) -> String {
        format!("{}{}", self.hub_name, HOST_SUFFIX)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HostName={};DeviceId={};SharedAccessKey={}",
            self.hostname(),
            self.device_id,
            self.shared_access_key
        )
    }
}

impl FromStr for ConnectionString {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut hub_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;

        for part in s.split(';') {
            let (field, value) = part.split_once('=').ok_or_else(|| {
                HubError::InvalidConnectionString(format!("malformed segment: {part:?}"))
            })?;
            match field {
                "HostName" => {
                    let name = value.strip_suffix(HOST_SUFFIX).ok_or_else(|| {
                        HubError::InvalidConnectionString(format!(
                            "host name must end with {HOST_SUFFIX}: {value:?}"
                        ))
                    })?;
                    hub_name = Some(name.to_string());
                }
                "DeviceId" => device_id = Some(value.to_string()),
                "SharedAccessKey" => shared_access_key = Some(value.to_string()),
                other => {
                    return Err(HubError::InvalidConnectionString(format!(
                        "unknown field: {other}"
                    )))
                }
            }
        }

        Ok(Self {
            hub_name: hub_name
                .ok_or_else(|| HubError::InvalidConnectionString("missing HostName".into()))?,
            device_id: device_id
                .ok_or_else(|| HubError::InvalidConnectionString("missing DeviceId".into()))?,
            shared_access_key: shared_access_key.ok_or_else(|| {
                HubError::InvalidConnectionString("missing SharedAccessKey".into())
            })?,
        })
    }
}
