//! # reminder-db
//!
//! Persistence layer: PostgreSQL connection pool management and the
//! generic, schema-driven [`EntityStore`].
//!
//! ## Overview
//!
//! The store performs CRUD against any entity type described by a
//! `reminder_core::EntitySchema`, enforces the status-based soft-delete
//! lifecycle, and never physically deletes rows.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reminder_db::pool::{create_pool, DatabaseConfig};
//! use reminder_db::EntityStore;
//!
//! async fn example(
//!     url: String,
//!     files: Arc<dyn reminder_core::FileStore>,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig { url, ..DatabaseConfig::default() };
//!     let pool = create_pool(&config).await?;
//!     // Fails fast when the well-known status rows are missing.
//!     let store = EntityStore::connect(pool, files).await?;
//!     Ok(())
//! }
//! ```

pub mod pool;
pub mod status;
pub mod store;

// Re-export commonly used types
pub use pool::{create_pool, DatabaseConfig, PgPool};
pub use status::StatusCache;
pub use store::EntityStore;

/// Apply the embedded schema migrations (creates the entity tables and
/// seeds the well-known status rows).
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
