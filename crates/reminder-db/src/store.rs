//! Generic entity store
//!
//! The persistence service: schema-driven CRUD over any entity type,
//! with status-based soft delete. Queries are assembled from the static
//! field descriptors, so a single engine serves every table.

use std::sync::Arc;

use chrono::Utc;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Postgres, Row};
use tracing::{error, instrument};

use reminder_core::{
    DomainError, EntityKind, EntitySchema, FieldType, FieldValue, FileStore, RawFields, Record,
    Status,
};

use crate::pool::PgPool;
use crate::status::StatusCache;

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Generic persistence service over a shared connection pool.
///
/// Construction resolves the well-known `active`/`inactive` statuses and
/// fails when either is missing; every lifecycle-sensitive operation
/// depends on them, so their absence is a startup error, never a
/// per-request one.
#[derive(Clone)]
pub struct EntityStore {
    pool: PgPool,
    files: Arc<dyn FileStore>,
    statuses: StatusCache,
}

impl EntityStore {
    /// Build the store and load the status lifecycle cache.
    pub async fn connect(pool: PgPool, files: Arc<dyn FileStore>) -> Result<Self, DomainError> {
        let statuses = StatusCache::load(&pool).await?;
        Ok(Self {
            pool,
            files,
            statuses,
        })
    }

    /// The shared connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// The startup-resolved status lifecycle cache.
    pub fn statuses(&self) -> &StatusCache {
        &self.statuses
    }

    /// Fetch rows of one entity type, newest id first.
    ///
    /// Owner, status, and the extra map become ANDed equality predicates;
    /// with no filter the whole table is scanned.
    #[instrument(skip(self))]
    pub async fn get_list(
        &self,
        kind: EntityKind,
        status: Option<&Status>,
        owner: Option<i64>,
        extra: &[(&str, FieldValue)],
    ) -> Result<Vec<Record>, DomainError> {
        let schema = kind.schema();

        let mut predicates: Vec<(&str, FieldValue)> = Vec::new();
        if let Some(owner) = owner {
            predicates.push(("user_id", FieldValue::Int(owner)));
        }
        if let Some(status) = status {
            predicates.push(("status_id", FieldValue::Int(status.id)));
        }
        for (field, value) in extra {
            predicates.push((field, value.clone()));
        }

        for (field, _) in &predicates {
            check_column(schema, field)?;
        }

        let mut sql = format!(
            "SELECT {} FROM {}",
            select_columns(schema),
            schema.table_name
        );
        if !predicates.is_empty() {
            let clauses: Vec<String> = predicates
                .iter()
                .enumerate()
                .map(|(i, (field, _))| format!("{field} = ${}", i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id DESC");

        let mut query = sqlx::query(&sql);
        for (_, value) in &predicates {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(map_db_error)?;
        rows.iter().map(|row| decode_row(kind, row)).collect()
    }

    /// Fetch one row by an equality predicate on a single field, with
    /// optional owner/status scoping. Zero matching rows is a value, not
    /// an error.
    #[instrument(skip(self))]
    pub async fn find_by_field(
        &self,
        kind: EntityKind,
        field: &str,
        value: FieldValue,
        status: Option<&Status>,
        owner: Option<i64>,
    ) -> Result<Option<Record>, DomainError> {
        fetch_one_by_field(&self.pool, kind, field, &value, status.map(|s| s.id), owner).await
    }

    /// Insert a new entity from raw field data.
    ///
    /// Any caller-supplied id is ignored; the row is created with the
    /// well-known active status and the given owner, then re-read by its
    /// generated id so the caller sees the store-computed timestamps.
    #[instrument(skip(self, raw))]
    pub async fn create(
        &self,
        kind: EntityKind,
        raw: &RawFields,
        owner: Option<i64>,
    ) -> Result<Record, DomainError> {
        let schema = kind.schema();

        let mut record = Record::from_raw(kind, raw);
        record.id = 0;
        if schema.has_status {
            record.status_id = Some(self.statuses.active().id);
        }
        if schema.has_owner {
            record.user_id = owner;
        }

        let saved = self.save(record).await?;

        // Re-read for the canonical server-computed fields
        self.find_by_field(
            kind,
            "id",
            FieldValue::Int(saved.id),
            self.active_scope(kind),
            owner,
        )
        .await?
        .ok_or(DomainError::EntityNotFound {
            kind: kind.as_str(),
            id: saved.id,
        })
    }

    /// Merge raw field data onto the current active row and persist.
    ///
    /// Caller-supplied fields win; everything else keeps its stored value.
    /// With `delete_files` set, externally-owned resources named by the
    /// schema's unlink fields are released before the merge.
    #[instrument(skip(self, raw))]
    pub async fn update(
        &self,
        kind: EntityKind,
        id: i64,
        raw: &RawFields,
        owner: Option<i64>,
        delete_files: bool,
    ) -> Result<Record, DomainError> {
        let scope = self.active_scope(kind);

        let mut record = self
            .find_by_field(kind, "id", FieldValue::Int(id), scope, owner)
            .await?
            .ok_or(DomainError::EntityNotFound {
                kind: kind.as_str(),
                id,
            })?;

        if delete_files {
            self.release_files(&record).await;
        }

        record.merge_raw(raw);
        self.save(record).await?;

        self.find_by_field(kind, "id", FieldValue::Int(id), scope, owner)
            .await?
            .ok_or(DomainError::EntityNotFound {
                kind: kind.as_str(),
                id,
            })
    }

    /// Soft delete: the row keeps existing, its status flips to inactive
    /// and `deleted` records when. Rows are never physically deleted.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        kind: EntityKind,
        id: i64,
        owner: Option<i64>,
        delete_files: bool,
    ) -> Result<(), DomainError> {
        let mut record = self
            .find_by_field(kind, "id", FieldValue::Int(id), self.active_scope(kind), owner)
            .await?
            .ok_or(DomainError::EntityNotFound {
                kind: kind.as_str(),
                id,
            })?;

        if kind.schema().has_status {
            record.status_id = Some(self.statuses.inactive().id);
        }
        record.deleted = Some(Utc::now());

        let record = self.save(record).await?;

        if delete_files {
            self.release_files(&record).await;
        }

        Ok(())
    }

    /// Bring a soft-deleted row back: loads the inactive row scoped to its
    /// owner and reassigns the active status. The `deleted` timestamp is
    /// left in place; status alone decides visibility.
    #[instrument(skip(self))]
    pub async fn restore_by_id(
        &self,
        kind: EntityKind,
        id: i64,
        owner: i64,
    ) -> Result<Record, DomainError> {
        let scope = kind.schema().has_status.then(|| self.statuses.inactive());

        let mut record = self
            .find_by_field(kind, "id", FieldValue::Int(id), scope, Some(owner))
            .await?
            .ok_or(DomainError::EntityNotFound {
                kind: kind.as_str(),
                id,
            })?;

        if kind.schema().has_status {
            record.status_id = Some(self.statuses.active().id);
        }

        self.save(record).await
    }

    /// Atomically claim the right to notify a reminder.
    ///
    /// Conditional update on `is_notified`: returns true only for the one
    /// caller whose update flipped the flag, so overlapping scheduler
    /// passes cannot both dispatch for the same reminder.
    #[instrument(skip(self))]
    pub async fn claim_reminder_notification(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE reminders SET is_notified = TRUE, updated = NOW() \
             WHERE id = $1 AND is_notified = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    /// Validate and persist a record: insert when `id == 0`, update by id
    /// otherwise. Only the schema's write fields plus the engine-managed
    /// status/owner/deleted columns are sent; `created`/`updated` are set
    /// by the store itself.
    async fn save(&self, mut record: Record) -> Result<Record, DomainError> {
        let errors = record.validate();
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let schema = record.kind.schema();
        let columns = write_columns(schema);

        if record.id == 0 {
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("${i}")).collect();
            let sql = format!(
                "INSERT INTO {} ({}, created, updated) VALUES ({}, NOW(), NOW()) RETURNING id",
                schema.table_name,
                columns.join(", "),
                placeholders.join(", ")
            );

            let mut query = sqlx::query(&sql);
            for column in &columns {
                query = bind_column(query, &record, schema, column);
            }

            let row = query.fetch_one(&self.pool).await.map_err(map_db_error)?;
            record.id = row.try_get("id").map_err(map_db_error)?;
        } else {
            let assignments: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(i, column)| format!("{column} = ${}", i + 1))
                .collect();
            let sql = format!(
                "UPDATE {} SET {}, updated = NOW() WHERE id = ${}",
                schema.table_name,
                assignments.join(", "),
                columns.len() + 1
            );

            let mut query = sqlx::query(&sql);
            for column in &columns {
                query = bind_column(query, &record, schema, column);
            }
            query = query.bind(record.id);

            let result = query.execute(&self.pool).await.map_err(map_db_error)?;
            if result.rows_affected() == 0 {
                return Err(DomainError::EntityNotFound {
                    kind: record.kind.as_str(),
                    id: record.id,
                });
            }
        }

        Ok(record)
    }

    /// Active-status scope for lifecycle-carrying kinds, no scope otherwise.
    fn active_scope(&self, kind: EntityKind) -> Option<&Status> {
        kind.schema().has_status.then(|| self.statuses.active())
    }

    /// Release every externally-owned resource the record references.
    /// The file store logs and swallows its own failures.
    async fn release_files(&self, record: &Record) {
        for field in record.kind.schema().unlink_fields {
            let path = record.text(field);
            if !path.is_empty() {
                self.files.release(path).await;
            }
        }
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("pool", &"PgPool")
            .field("statuses", &self.statuses)
            .finish()
    }
}

/// Shared single-row lookup, also used by the status cache at startup.
pub(crate) async fn fetch_one_by_field(
    pool: &PgPool,
    kind: EntityKind,
    field: &str,
    value: &FieldValue,
    status_id: Option<i64>,
    owner: Option<i64>,
) -> Result<Option<Record>, DomainError> {
    let schema = kind.schema();
    check_column(schema, field)?;

    let mut sql = format!(
        "SELECT {} FROM {} WHERE {field} = $1",
        select_columns(schema),
        schema.table_name
    );
    let mut next = 1;
    if owner.is_some() {
        next += 1;
        sql.push_str(&format!(" AND user_id = ${next}"));
    }
    if status_id.is_some() {
        next += 1;
        sql.push_str(&format!(" AND status_id = ${next}"));
    }

    let mut query = bind_value(sqlx::query(&sql), value);
    if let Some(owner) = owner {
        query = query.bind(owner);
    }
    if let Some(status_id) = status_id {
        query = query.bind(status_id);
    }

    let row = query.fetch_optional(pool).await.map_err(map_db_error)?;
    row.as_ref().map(|r| decode_row(kind, r)).transpose()
}

/// Wrap any sqlx failure: full detail to the log, opaque error to the caller.
pub(crate) fn map_db_error(e: sqlx::Error) -> DomainError {
    error!(error = %e, "database query failed");
    DomainError::Storage
}

/// Reject column names the schema does not declare. Field names are
/// interpolated into SQL, so this is the guard that keeps the equality
/// maps equality maps.
fn check_column(schema: &EntitySchema, field: &str) -> Result<(), DomainError> {
    if schema.is_column(field) {
        Ok(())
    } else {
        error!(table = schema.table_name, field, "unknown field in query");
        Err(DomainError::Storage)
    }
}

/// Column list for SELECT, in schema order: id, lifecycle references,
/// declared read fields, timestamps.
fn select_columns(schema: &EntitySchema) -> String {
    let mut columns = vec!["id"];
    if schema.has_status {
        columns.push("status_id");
    }
    if schema.has_owner {
        columns.push("user_id");
    }
    for descriptor in schema.read_fields {
        columns.push(descriptor.name);
    }
    columns.extend(["created", "updated", "deleted"]);
    columns.join(", ")
}

/// Columns sent on persist: the write fields plus engine-managed ones.
fn write_columns(schema: &EntitySchema) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = schema.write_fields.to_vec();
    if schema.has_status {
        columns.push("status_id");
    }
    if schema.has_owner {
        columns.push("user_id");
    }
    columns.push("deleted");
    columns
}

/// Bind a filter value by its own variant.
fn bind_value<'q>(query: PgQuery<'q>, value: &FieldValue) -> PgQuery<'q> {
    match value {
        FieldValue::Null => query.bind(Option::<String>::None),
        FieldValue::Text(s) => query.bind(s.clone()),
        FieldValue::Int(n) => query.bind(*n),
        FieldValue::Bool(b) => query.bind(*b),
        FieldValue::DateTime(dt) => query.bind(*dt),
    }
}

/// Bind one persisted column. Declared fields bind by their schema type
/// (so NULLs carry the right SQL type); engine-managed columns bind their
/// native representation.
fn bind_column<'q>(
    query: PgQuery<'q>,
    record: &Record,
    schema: &EntitySchema,
    column: &str,
) -> PgQuery<'q> {
    match column {
        "status_id" => query.bind(record.status_id),
        "user_id" => query.bind(record.user_id),
        "deleted" => query.bind(record.deleted),
        name => {
            let Some(descriptor) = schema.field(name) else {
                return query.bind(Option::<String>::None);
            };
            match (descriptor.ty, record.value(name)) {
                (FieldType::Text, FieldValue::Text(s)) => query.bind(s.clone()),
                (FieldType::Text, _) => query.bind(Option::<String>::None),
                (FieldType::Int, FieldValue::Int(n)) => query.bind(*n),
                (FieldType::Int, _) => query.bind(Option::<i64>::None),
                (FieldType::Bool, FieldValue::Bool(b)) => query.bind(*b),
                (FieldType::Bool, _) => query.bind(Option::<bool>::None),
            }
        }
    }
}

/// Decode one row into a record via the schema's field descriptors.
fn decode_row(kind: EntityKind, row: &PgRow) -> Result<Record, DomainError> {
    let schema = kind.schema();
    let mut record = Record::new(kind);

    record.id = row.try_get("id").map_err(map_db_error)?;
    if schema.has_status {
        record.status_id = row.try_get("status_id").map_err(map_db_error)?;
    }
    if schema.has_owner {
        record.user_id = row.try_get("user_id").map_err(map_db_error)?;
    }
    record.created = row.try_get("created").map_err(map_db_error)?;
    record.updated = row.try_get("updated").map_err(map_db_error)?;
    record.deleted = row.try_get("deleted").map_err(map_db_error)?;

    for descriptor in schema.read_fields {
        let value = match descriptor.ty {
            FieldType::Text => row
                .try_get::<Option<String>, _>(descriptor.name)
                .map_err(map_db_error)?
                .map_or(FieldValue::Null, FieldValue::Text),
            FieldType::Int => row
                .try_get::<Option<i64>, _>(descriptor.name)
                .map_err(map_db_error)?
                .map_or(FieldValue::Null, FieldValue::Int),
            FieldType::Bool => row
                .try_get::<Option<bool>, _>(descriptor.name)
                .map_err(map_db_error)?
                .map_or(FieldValue::Null, FieldValue::Bool),
        };
        record.set_value(descriptor.name, value);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_columns_layout() {
        assert_eq!(
            select_columns(EntityKind::Status.schema()),
            "id, name, title, created, updated, deleted"
        );
        assert_eq!(
            select_columns(EntityKind::Reminder.schema()),
            "id, status_id, user_id, title, date_time, is_notified, photo_path, \
             created, updated, deleted"
        );
    }

    #[test]
    fn test_write_columns_include_engine_managed() {
        let columns = write_columns(EntityKind::Reminder.schema());
        assert!(columns.contains(&"status_id"));
        assert!(columns.contains(&"user_id"));
        assert!(columns.contains(&"deleted"));
        assert!(!columns.contains(&"id"));
        assert!(!columns.contains(&"created"));

        let columns = write_columns(EntityKind::Status.schema());
        assert_eq!(columns, vec!["name", "title", "deleted"]);
    }

    #[test]
    fn test_check_column_rejects_undeclared_names() {
        let schema = EntityKind::Reminder.schema();
        assert!(check_column(schema, "title").is_ok());
        assert!(check_column(schema, "user_id").is_ok());
        assert!(check_column(schema, "email").is_err());
        assert!(check_column(schema, "1=1; --").is_err());
    }
}
