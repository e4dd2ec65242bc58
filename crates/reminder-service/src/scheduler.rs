//! Notification scheduler
//!
//! Periodically scans for active, not-yet-notified reminders and pushes
//! the ones entering their dispatch window to every device token the
//! owner has registered. The conditional claim in the store guarantees
//! at most one dispatch per reminder even across overlapping passes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use reminder_core::{
    decode_push_tokens, EntityKind, FieldValue, PushPayload, PushSink, Record, Reminder,
};
use reminder_db::EntityStore;

use crate::error::ServiceResult;

/// Background scheduler for reminder push notifications
pub struct NotificationScheduler {
    store: Arc<EntityStore>,
    sink: Arc<dyn PushSink>,
    interval: Duration,
    window_secs: i64,
}

impl NotificationScheduler {
    /// Create a new NotificationScheduler
    pub fn new(
        store: Arc<EntityStore>,
        sink: Arc<dyn PushSink>,
        interval: Duration,
        window_secs: i64,
    ) -> Self {
        Self {
            store,
            sink,
            interval,
            window_secs,
        }
    }

    /// Run scheduler passes until the shutdown signal flips to true.
    ///
    /// A failed pass is logged and the loop keeps going; the scheduler
    /// only stops on shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs(),
            window_secs = self.window_secs,
            "notification scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "scheduler pass failed");
                    }
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("notification scheduler stopped");
    }

    /// One scheduler pass. Returns the number of reminders dispatched.
    #[instrument(skip(self))]
    pub async fn tick(&self) -> ServiceResult<usize> {
        let pending = self
            .store
            .get_list(
                EntityKind::Reminder,
                Some(self.store.statuses().active()),
                None,
                &[("is_notified", FieldValue::Bool(false))],
            )
            .await?;

        if pending.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let results = join_all(
            pending
                .iter()
                .map(|record| self.process_reminder(record, now)),
        )
        .await;

        let dispatched = results.into_iter().filter(|sent| *sent).count();
        if dispatched > 0 {
            info!(dispatched, "scheduler pass dispatched notifications");
        }
        Ok(dispatched)
    }

    /// Handle one pending reminder; true when a notification went out.
    async fn process_reminder(&self, record: &Record, now: DateTime<Utc>) -> bool {
        let reminder = Reminder::from_record(record);

        if !due_within_window(reminder.seconds_until_due(now), self.window_secs) {
            return false;
        }

        let Some(owner) = reminder.user_id else {
            debug!(reminder_id = reminder.id, "pending reminder has no owner");
            return false;
        };

        let tokens = match self.owner_tokens(owner).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(reminder_id = reminder.id, error = %e, "owner lookup failed");
                return false;
            }
        };
        if tokens.is_empty() {
            debug!(
                reminder_id = reminder.id,
                user_id = owner,
                "owner has no registered devices"
            );
            return false;
        }

        // Claim before dispatch: a lost claim means another pass got here first.
        match self.store.claim_reminder_notification(reminder.id).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                warn!(reminder_id = reminder.id, error = %e, "notification claim failed");
                return false;
            }
        }

        let payload = PushPayload {
            title: reminder.title.clone(),
            date_time: reminder.date_time.clone(),
            user_id: owner,
            reminder_id: reminder.id,
            entity: EntityKind::Reminder.as_str(),
        };

        for token in &tokens {
            self.sink.send(token, &payload).await;
        }

        info!(
            reminder_id = reminder.id,
            user_id = owner,
            devices = tokens.len(),
            "reminder notification dispatched"
        );
        true
    }

    async fn owner_tokens(&self, owner: i64) -> ServiceResult<Vec<String>> {
        let record = self
            .store
            .find_by_field(
                EntityKind::User,
                "id",
                FieldValue::Int(owner),
                Some(self.store.statuses().active()),
                None,
            )
            .await?;

        Ok(record
            .map(|r| decode_push_tokens(r.text("push_tokens")))
            .unwrap_or_default())
    }
}

/// Dispatch window check: strictly in the future and strictly inside
/// the window. Overdue reminders are never dispatched late.
fn due_within_window(seconds_until_due: Option<i64>, window_secs: i64) -> bool {
    matches!(seconds_until_due, Some(secs) if secs > 0 && secs < window_secs)
}
