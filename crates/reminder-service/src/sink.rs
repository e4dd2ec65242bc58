//! Push sink implementations

use async_trait::async_trait;
use tracing::info;

use reminder_core::{PushPayload, PushSink};

/// Sink that writes every dispatch to the log instead of a push
/// provider. The default when no provider is wired in.
#[derive(Debug, Default)]
pub struct LoggingPushSink;

#[async_trait]
impl PushSink for LoggingPushSink {
    async fn send(&self, device_token: &str, payload: &PushPayload) {
        info!(
            device_token,
            reminder_id = payload.reminder_id,
            user_id = payload.user_id,
            title = %payload.title,
            "push notification"
        );
    }
}
