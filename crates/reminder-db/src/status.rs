//! Status lifecycle cache
//!
//! The `active`/`inactive` statuses are immutable reference data: resolved
//! by name once at startup and held for the process lifetime. Their
//! absence aborts initialization.

use tracing::info;

use reminder_core::{DomainError, EntityKind, FieldValue, Status};

use crate::pool::PgPool;
use crate::store::fetch_one_by_field;

/// Startup-resolved well-known statuses
#[derive(Debug, Clone)]
pub struct StatusCache {
    active: Status,
    inactive: Status,
}

impl StatusCache {
    /// Resolve both well-known statuses, failing with
    /// [`DomainError::StatusNotFound`] when either row is missing.
    pub(crate) async fn load(pool: &PgPool) -> Result<Self, DomainError> {
        let active = resolve(pool, Status::ACTIVE).await?;
        let inactive = resolve(pool, Status::INACTIVE).await?;

        info!(
            active_id = active.id,
            inactive_id = inactive.id,
            "status lifecycle cache loaded"
        );

        Ok(Self { active, inactive })
    }

    /// The live state
    pub fn active(&self) -> &Status {
        &self.active
    }

    /// The soft-deleted state
    pub fn inactive(&self) -> &Status {
        &self.inactive
    }
}

async fn resolve(pool: &PgPool, name: &'static str) -> Result<Status, DomainError> {
    let record = fetch_one_by_field(
        pool,
        EntityKind::Status,
        "name",
        &FieldValue::from(name),
        None,
        None,
    )
    .await?;

    record
        .map(|r| Status::from_record(&r))
        .ok_or(DomainError::StatusNotFound(name))
}
