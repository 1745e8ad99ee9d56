//! Per-device telemetry snapshot
//!
//! The snapshot is the only resource shared between a device's session and
//! its publisher. The session's event loop writes converted readings into
//! it (last-write-wins per field) and flips `send_enabled` on connect and
//! disconnect; the publisher reads it non-destructively on every tick.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    fields: BTreeMap<String, f64>,
    send_enabled: bool,
}

/// Latest known value set for one device's enabled channels.
///
/// Cheap to clone; clones share the same underlying state. Fields are never
/// cleared, only gated inactive via `send_enabled` while the device is
/// disconnected.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    inner: Arc<Mutex<Inner>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a writer panicked mid-update; the data
        // is per-field independent, so recover the inner value.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a converted reading. Last write wins per field.
    pub fn record(&self, field: &str, value: f64) {
        self.lock().fields.insert(field.to_string(), value);
    }

    /// Gate whether the publisher may transmit this snapshot.
    pub fn set_send_enabled(&self, enabled: bool) {
        self.lock().send_enabled = enabled;
    }

    pub fn send_enabled(&self) -> bool {
        self.lock().send_enabled
    }

    pub fn is_empty(&self) -> bool {
        self.lock().fields.is_empty()
    }

    /// Copy of the current field map, for inspection.
    pub fn fields(&self) -> BTreeMap<String, f64> {
        self.lock().fields.clone()
    }

    /// Build the outbound payload: every known field plus `DeviceId` set to
    /// the device's display name. Returns `None` when there is nothing to
    /// send - no field has reported yet, or sending is disabled.
    pub fn payload(&self, device_name: &str) -> Option<Value> {
        let inner = self.lock();
        if inner.fields.is_empty() || !inner.send_enabled {
            return None;
        }
        let mut map = serde_json::Map::new();
        for (field, value) in &inner.fields {
            map.insert(field.clone(), json!(*value));
        }
        map.insert("DeviceId".to_string(), json!(device_name));
        Some(Value::Object(map))
    }
}
