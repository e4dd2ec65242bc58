//! # reminder-core
//!
//! Domain layer containing entity schemas, the generic record representation,
//! typed entity views, and capability traits for injected collaborators.
//! This crate has zero dependencies on infrastructure (database, push transport, etc.).

pub mod entities;
pub mod error;
pub mod fields;
pub mod record;
pub mod schema;
pub mod traits;

// Re-export commonly used types at crate root
pub use entities::{decode_push_tokens, encode_push_tokens, Counter, Reminder, Status, User};
pub use error::DomainError;
pub use fields::{FieldType, FieldValue, RawFields};
pub use record::Record;
pub use schema::{EntityKind, EntitySchema, FieldDescriptor, Rule};
pub use traits::{FileStore, PushPayload, PushSink};
