//! Recording mock sink for tests

use crate::{HubError, Result, TelemetrySink};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A sink that records every payload handed to it.
///
/// Clones share state. When switched to failing, attempts are still
/// recorded but reported as delivery failures, so tests can check that
/// ticks stay independent of delivery outcome.
#[derive(Clone, Default)]
pub struct MockSink {
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every payload handed to the sink, in delivery order, including
    /// attempts that were reported as failed.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl TelemetrySink for MockSink {
    async fn send_event(&self, payload: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(payload.to_string());
        if self.failing.load(Ordering::SeqCst) {
            Err(HubError::Delivery("mock sink failing".to_string()))
        } else {
            Ok(())
        }
    }
}
