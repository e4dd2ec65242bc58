//! Capability traits for injected collaborators
//!
//! The engine consumes these but never implements the transports behind
//! them: push delivery and externally-owned resource release are plugged
//! in at wiring time.

use async_trait::async_trait;
use serde::Serialize;

/// Message handed to the push sink, one per registered device token.
#[derive(Debug, Clone, Serialize)]
pub struct PushPayload {
    pub title: String,
    pub date_time: String,
    pub user_id: i64,
    pub reminder_id: i64,
    /// Entity kind the notification refers to
    pub entity: &'static str,
}

/// Best-effort push delivery. Failures are the sink's problem: delivery
/// is fire-and-forget and never surfaces back to the scheduler.
#[async_trait]
pub trait PushSink: Send + Sync {
    async fn send(&self, device_token: &str, payload: &PushPayload);
}

/// Releases externally-owned resources referenced by unlink fields
/// (e.g. uploaded files). Implementations log and swallow failures.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn release(&self, path: &str);
}
