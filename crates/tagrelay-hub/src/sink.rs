//! Telemetry delivery
//!
//! [`HttpSink`] posts device-to-cloud messages over the hub's HTTPS surface,
//! authenticating with a shared-access signature derived from the device
//! key. Tokens are cached and renewed shortly before expiry.

use crate::{ConnectionString, HubError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use sha2::Sha256;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

const API_VERSION: &str = "2021-04-12";
const TOKEN_TTL: Duration = Duration::from_secs(3600);
const TOKEN_RENEW_MARGIN: Duration = Duration::from_secs(300);

/// Destination for serialized telemetry payloads.
///
/// Implementations report per-message success or failure and make no
/// delivery guarantee beyond that; there is no buffering and no retry.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn send_event(&self, payload: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
struct SasToken {
    value: String,
    expires_at: u64,
}

/// HTTPS device-to-cloud message sink.
pub struct HttpSink {
    client: reqwest::Client,
    conn: ConnectionString,
    endpoint: String,
    token: Mutex<Option<SasToken>>,
}

impl HttpSink {
    pub fn new(conn: ConnectionString) -> Self {
        let endpoint = format!(
            "https://{}/devices/{}/messages/events?api-version={}",
            conn.hostname(),
            conn.device_id,
            API_VERSION
        );
        Self {
            client: reqwest::Client::new(),
            conn,
            endpoint,
            token: Mutex::new(None),
        }
    }

    /// Return a valid SAS token, generating a fresh one when the cached
    /// token is missing or close to expiry.
    fn current_token(&self) -> Result<String> {
        let now = unix_now();
        let mut cached = self.token.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(token) = cached.as_ref() {
            if token.expires_at > now + TOKEN_RENEW_MARGIN.as_secs() {
                return Ok(token.value.clone());
            }
        }
        let expires_at = now + TOKEN_TTL.as_secs();
        let value = generate_sas_token(&self.conn, expires_at)?;
        debug!(device = %self.conn.device_id, expires_at, "generated SAS token");
        *cached = Some(SasToken {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn send_event(&self, payload: &str) -> Result<()> {
        let token = self.current_token()?;
        trace!(device = %self.conn.device_id, bytes = payload.len(), "posting telemetry");
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", token)
            .header("Content-Type", "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| HubError::Delivery(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(HubError::Delivery(format!(
                "hub returned {}",
                response.status()
            )))
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Build a `SharedAccessSignature sr=..&sig=..&se=..` token for the device
/// endpoint, valid until `expires_at` (unix seconds).
fn generate_sas_token(conn: &ConnectionString, expires_at: u64) -> Result<String> {
    let resource = format!("{}/devices/{}", conn.hostname(), conn.device_id);
    let encoded_resource = utf8_percent_encode(&resource, NON_ALPHANUMERIC).to_string();

    let key = BASE64
        .decode(&conn.shared_access_key)
        .map_err(|e| HubError::InvalidKey(e.to_string()))?;
    let mut mac = Hmac::<Sha256>::new_from_slice(&key)
        .map_err(|e| HubError::InvalidKey(e.to_string()))?;
    mac.update(format!("{encoded_resource}\n{expires_at}").as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    Ok(format!(
        "SharedAccessSignature sr={}&sig={}&se={}",
        encoded_resource,
        utf8_percent_encode(&signature, NON_ALPHANUMERIC),
        expires_at
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sas_token_shape() {
        let conn = ConnectionString::new("myhub", "office-tag", &BASE64.encode(b"secret"));
        let token = generate_sas_token(&conn, 1_700_000_000).unwrap();
        assert!(token.starts_with(
            "SharedAccessSignature sr=myhub%2Eazure%2Ddevices%2Enet%2Fdevices%2Foffice%2Dtag&sig="
        ));
        assert!(token.ends_with("&se=1700000000"));
    }

    #[test]
    fn test_sas_token_is_deterministic_for_fixed_expiry() {
        let conn = ConnectionString::new("myhub", "office-tag", &BASE64.encode(b"secret"));
        let a = generate_sas_token(&conn, 1_700_000_000).unwrap();
        let b = generate_sas_token(&conn, 1_700_000_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bad_key_rejected() {
        let conn = ConnectionString::new("myhub", "office-tag", "not base64 !!!");
        assert!(matches!(
            generate_sas_token(&conn, 1_700_000_000),
            Err(HubError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_endpoint_shape() {
        let sink = HttpSink::new(ConnectionString::new("myhub", "office-tag", "c2VjcmV0"));
        assert_eq!(
            sink.endpoint,
            "https://myhub.azure-devices.net/devices/office-tag/messages/events?api-version=2021-04-12"
        );
    }
}
