//! Static entity schemas
//!
//! Each entity type is described by an [`EntitySchema`]: its table, an
//! ordered list of typed field descriptors for reads, the subset of fields
//! the store is allowed to write, the fields referencing externally-owned
//! resources, and declarative validation rules. The mapping is static:
//! generic (de)serialization consumes the descriptors, no runtime
//! reflection involved.

use validator::ValidateEmail;

use crate::fields::{FieldType, FieldValue};

/// Declarative validation constraint for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value must be present and non-empty
    Required,
    /// Text value must not exceed this many characters
    MaxLen(usize),
    /// Text value must be a well-formed email address
    Email,
    /// Text value must parse as an RFC 3339 timestamp
    DateTime,
}

impl Rule {
    /// Evaluate the rule against a value, returning a human-readable
    /// message on violation. Empty optional values only violate `Required`.
    pub fn check(self, field: &str, value: &FieldValue) -> Option<String> {
        match self {
            Self::Required => value
                .is_empty()
                .then(|| format!("The {field} field is required.")),
            Self::MaxLen(max) => match value.as_text() {
                Some(text) if text.chars().count() > max => {
                    Some(format!("The {field} may not be greater than {max} characters."))
                }
                _ => None,
            },
            Self::Email => match value.as_text() {
                Some(text) if !text.is_empty() && !text.validate_email() => {
                    Some(format!("The {field} format is invalid."))
                }
                _ => None,
            },
            Self::DateTime => match value.as_text() {
                Some(text)
                    if !text.is_empty()
                        && chrono::DateTime::parse_from_rfc3339(text).is_err() =>
                {
                    Some(format!("The {field} is not a valid timestamp."))
                }
                _ => None,
            },
        }
    }
}

/// One declared field: name, storage type, and validation rules
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
    pub rules: &'static [Rule],
}

/// Per-type schema descriptor consumed by the persistence engine
#[derive(Debug)]
pub struct EntitySchema {
    pub table_name: &'static str,
    /// Fields serialized on fetch, in column order
    pub read_fields: &'static [FieldDescriptor],
    /// Subset of read field names the store writes on persist
    pub write_fields: &'static [&'static str],
    /// Fields referencing externally-owned resources, released on delete
    pub unlink_fields: &'static [&'static str],
    /// Row carries a lifecycle status column
    pub has_status: bool,
    /// Row carries an owner reference column
    pub has_owner: bool,
}

impl EntitySchema {
    /// Look up the descriptor of a declared read field.
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.read_fields.iter().find(|f| f.name == name)
    }

    /// Whether `name` is a column the engine may reference in a query:
    /// a declared read field or an engine-managed column.
    pub fn is_column(&self, name: &str) -> bool {
        if self.field(name).is_some() {
            return true;
        }
        match name {
            "id" | "created" | "updated" | "deleted" => true,
            "status_id" => self.has_status,
            "user_id" => self.has_owner,
            _ => false,
        }
    }
}

/// The entity types known to the persistence engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Reminder,
    Status,
    Counter,
}

impl EntityKind {
    /// Resolve the static schema for this type.
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            Self::User => &USER_SCHEMA,
            Self::Reminder => &REMINDER_SCHEMA,
            Self::Status => &STATUS_SCHEMA,
            Self::Counter => &COUNTER_SCHEMA,
        }
    }

    /// Stable lowercase name, used in error messages and push payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Reminder => "reminder",
            Self::Status => "status",
            Self::Counter => "counter",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static USER_SCHEMA: EntitySchema = EntitySchema {
    table_name: "users",
    read_fields: &[
        FieldDescriptor {
            name: "first_name",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::MaxLen(255)],
        },
        FieldDescriptor {
            name: "second_name",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::MaxLen(255)],
        },
        FieldDescriptor {
            name: "email",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::Email, Rule::MaxLen(100)],
        },
        FieldDescriptor {
            name: "password_hash",
            ty: FieldType::Text,
            rules: &[],
        },
        FieldDescriptor {
            name: "push_tokens",
            ty: FieldType::Text,
            rules: &[Rule::MaxLen(65535)],
        },
    ],
    write_fields: &[
        "first_name",
        "second_name",
        "email",
        "password_hash",
        "push_tokens",
    ],
    unlink_fields: &[],
    has_status: true,
    has_owner: false,
};

static REMINDER_SCHEMA: EntitySchema = EntitySchema {
    table_name: "reminders",
    read_fields: &[
        FieldDescriptor {
            name: "title",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::MaxLen(255)],
        },
        FieldDescriptor {
            name: "date_time",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::DateTime, Rule::MaxLen(55)],
        },
        FieldDescriptor {
            name: "is_notified",
            ty: FieldType::Bool,
            rules: &[],
        },
        FieldDescriptor {
            name: "photo_path",
            ty: FieldType::Text,
            rules: &[Rule::MaxLen(255)],
        },
    ],
    write_fields: &["title", "date_time", "is_notified", "photo_path"],
    unlink_fields: &["photo_path"],
    has_status: true,
    has_owner: true,
};

static STATUS_SCHEMA: EntitySchema = EntitySchema {
    table_name: "statuses",
    read_fields: &[
        FieldDescriptor {
            name: "name",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::MaxLen(100)],
        },
        FieldDescriptor {
            name: "title",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::MaxLen(255)],
        },
    ],
    write_fields: &["name", "title"],
    unlink_fields: &[],
    has_status: false,
    has_owner: false,
};

static COUNTER_SCHEMA: EntitySchema = EntitySchema {
    table_name: "counters",
    read_fields: &[
        FieldDescriptor {
            name: "name",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::MaxLen(255)],
        },
        FieldDescriptor {
            name: "title",
            ty: FieldType::Text,
            rules: &[Rule::Required, Rule::MaxLen(255)],
        },
        FieldDescriptor {
            name: "date_time",
            ty: FieldType::Text,
            rules: &[Rule::DateTime, Rule::MaxLen(155)],
        },
        FieldDescriptor {
            name: "is_system",
            ty: FieldType::Bool,
            rules: &[],
        },
    ],
    write_fields: &["name", "title", "date_time", "is_system"],
    unlink_fields: &[],
    has_status: true,
    has_owner: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_fields_are_subset_of_read_fields() {
        for kind in [
            EntityKind::User,
            EntityKind::Reminder,
            EntityKind::Status,
            EntityKind::Counter,
        ] {
            let schema = kind.schema();
            for name in schema.write_fields {
                assert!(
                    schema.field(name).is_some(),
                    "{kind}: write field {name} not declared as read field"
                );
            }
            for name in schema.unlink_fields {
                assert!(schema.field(name).is_some());
            }
        }
    }

    #[test]
    fn test_engine_columns() {
        let reminders = EntityKind::Reminder.schema();
        assert!(reminders.is_column("id"));
        assert!(reminders.is_column("status_id"));
        assert!(reminders.is_column("user_id"));
        assert!(reminders.is_column("deleted"));
        assert!(!reminders.is_column("email"));
        assert!(!reminders.is_column("title; DROP TABLE reminders"));

        let statuses = EntityKind::Status.schema();
        assert!(!statuses.is_column("status_id"));
        assert!(!statuses.is_column("user_id"));

        let users = EntityKind::User.schema();
        assert!(users.is_column("status_id"));
        assert!(!users.is_column("user_id"));
    }

    #[test]
    fn test_required_rule() {
        let msg = Rule::Required.check("title", &FieldValue::Text(String::new()));
        assert_eq!(msg.as_deref(), Some("The title field is required."));
        assert!(Rule::Required
            .check("title", &FieldValue::Text("ok".into()))
            .is_none());
        assert!(Rule::Required.check("title", &FieldValue::Null).is_some());
    }

    #[test]
    fn test_max_len_rule() {
        let long = "x".repeat(256);
        assert!(Rule::MaxLen(255)
            .check("title", &FieldValue::Text(long))
            .is_some());
        assert!(Rule::MaxLen(255)
            .check("title", &FieldValue::Text("short".into()))
            .is_none());
    }

    #[test]
    fn test_email_rule() {
        assert!(Rule::Email
            .check("email", &FieldValue::Text("not-an-email".into()))
            .is_some());
        assert!(Rule::Email
            .check("email", &FieldValue::Text("user@example.com".into()))
            .is_none());
        // Emptiness is Required's business, not Email's
        assert!(Rule::Email
            .check("email", &FieldValue::Text(String::new()))
            .is_none());
    }

    #[test]
    fn test_date_time_rule() {
        assert!(Rule::DateTime
            .check("date_time", &FieldValue::Text("tomorrow-ish".into()))
            .is_some());
        assert!(Rule::DateTime
            .check(
                "date_time",
                &FieldValue::Text("2024-03-01T12:30:00.000Z".into())
            )
            .is_none());
    }
}
