//! Generic entity record
//!
//! A [`Record`] is the typed representation of one row of any entity type,
//! built from raw field data through the type's schema. The persistence
//! engine operates on records; typed views project them into concrete
//! entities.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::fields::{FieldValue, RawFields};
use crate::schema::EntityKind;

/// One row of an entity type.
///
/// `id == 0` means "not yet persisted" and selects the insert path;
/// any other id selects the update path. `created`/`updated`/`deleted`
/// and the status/owner references are engine-managed and never enter
/// through raw field data merges.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: EntityKind,
    pub id: i64,
    pub status_id: Option<i64>,
    pub user_id: Option<i64>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub deleted: Option<DateTime<Utc>>,
    fields: BTreeMap<&'static str, FieldValue>,
}

impl Record {
    /// An unpersisted record with every declared field at its default.
    pub fn new(kind: EntityKind) -> Self {
        let fields = kind
            .schema()
            .read_fields
            .iter()
            .map(|f| (f.name, FieldValue::default_for(f.ty)))
            .collect();

        Self {
            kind,
            id: 0,
            status_id: None,
            user_id: None,
            created: None,
            updated: None,
            deleted: None,
            fields,
        }
    }

    /// Build a record from raw field data.
    ///
    /// Only declared read fields are projected; unknown keys are ignored
    /// and missing fields take their type default. Values are coerced to
    /// the declared type, which normalizes date values supplied for text
    /// fields into canonical RFC 3339 strings.
    pub fn from_raw(kind: EntityKind, raw: &RawFields) -> Self {
        let mut record = Self::new(kind);

        if let Some(id) = raw.get("id").and_then(FieldValue::as_int) {
            record.id = id;
        }

        for descriptor in kind.schema().read_fields {
            if let Some(value) = raw.get(descriptor.name) {
                record
                    .fields
                    .insert(descriptor.name, value.clone().coerce(descriptor.ty));
            }
        }

        record
    }

    /// Merge raw field data onto this record: caller-supplied declared
    /// fields win, everything else is left untouched. Unknown keys are
    /// ignored, as are the engine-managed columns.
    pub fn merge_raw(&mut self, raw: &RawFields) {
        for descriptor in self.kind.schema().read_fields {
            if let Some(value) = raw.get(descriptor.name) {
                self.fields
                    .insert(descriptor.name, value.clone().coerce(descriptor.ty));
            }
        }
    }

    /// Value of a declared field; `Null` for anything undeclared.
    pub fn value(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&FieldValue::Null)
    }

    /// Set a declared field, coercing to its type. Returns false (and
    /// changes nothing) when the field is not part of the schema.
    pub fn set_value(&mut self, name: &str, value: FieldValue) -> bool {
        match self.kind.schema().field(name) {
            Some(descriptor) => {
                self.fields.insert(descriptor.name, value.coerce(descriptor.ty));
                true
            }
            None => false,
        }
    }

    /// Text value of a declared field, empty string when null.
    pub fn text(&self, name: &str) -> &str {
        self.value(name).as_text().unwrap_or_default()
    }

    /// Integer value of a declared field, zero when null.
    pub fn int(&self, name: &str) -> i64 {
        self.value(name).as_int().unwrap_or_default()
    }

    /// Boolean value of a declared field, false when null.
    pub fn flag(&self, name: &str) -> bool {
        self.value(name).as_bool().unwrap_or_default()
    }

    /// Run the declarative rule set over every declared field, in schema
    /// order. An empty list means the record is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for descriptor in self.kind.schema().read_fields {
            let value = self.value(descriptor.name);
            for rule in descriptor.rules {
                if let Some(message) = rule.check(descriptor.name, value) {
                    errors.push(message);
                }
            }
        }
        errors
    }

    /// Whether this record has been soft deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(pairs: &[(&str, FieldValue)]) -> RawFields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_from_raw_projects_declared_fields_only() {
        let data = raw(&[
            ("title", "Dentist".into()),
            ("date_time", "2024-03-01T12:30:00.000Z".into()),
            ("favourite_color", "purple".into()),
        ]);
        let record = Record::from_raw(EntityKind::Reminder, &data);

        assert_eq!(record.text("title"), "Dentist");
        assert_eq!(record.text("date_time"), "2024-03-01T12:30:00.000Z");
        // unknown key ignored
        assert_eq!(record.value("favourite_color"), &FieldValue::Null);
        // missing field defaulted
        assert!(!record.flag("is_notified"));
        assert_eq!(record.id, 0);
    }

    #[test]
    fn test_from_raw_normalizes_date_values() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let data = raw(&[
            ("title", "Dentist".into()),
            ("date_time", FieldValue::DateTime(dt)),
        ]);
        let record = Record::from_raw(EntityKind::Reminder, &data);
        assert_eq!(record.text("date_time"), "2024-03-01T12:30:00.000Z");
    }

    #[test]
    fn test_merge_raw_supplied_fields_win() {
        let data = raw(&[
            ("title", "A".into()),
            ("date_time", "2024-03-01T12:30:00.000Z".into()),
        ]);
        let mut record = Record::from_raw(EntityKind::Reminder, &data);
        record.id = 7;

        record.merge_raw(&raw(&[("title", "B".into())]));

        assert_eq!(record.text("title"), "B");
        // untouched field keeps its value
        assert_eq!(record.text("date_time"), "2024-03-01T12:30:00.000Z");
        // engine-managed columns do not merge
        record.merge_raw(&raw(&[("id", FieldValue::Int(99))]));
        assert_eq!(record.id, 7);
    }

    #[test]
    fn test_validate_collects_messages_in_order() {
        let record = Record::from_raw(
            EntityKind::Reminder,
            &raw(&[("date_time", "not a timestamp".into())]),
        );
        let errors = record.validate();

        assert!(errors.len() >= 2);
        assert_eq!(errors[0], "The title field is required.");
        assert!(errors.iter().any(|e| e.contains("valid timestamp")));
    }

    #[test]
    fn test_validate_ok_for_well_formed_reminder() {
        let record = Record::from_raw(
            EntityKind::Reminder,
            &raw(&[
                ("title", "Dentist".into()),
                ("date_time", "2024-03-01T12:30:00.000Z".into()),
            ]),
        );
        assert!(record.validate().is_empty());
    }

    #[test]
    fn test_set_value_rejects_undeclared_fields() {
        let mut record = Record::new(EntityKind::User);
        assert!(record.set_value("email", "a@b.com".into()));
        assert!(!record.set_value("title", "nope".into()));
        assert_eq!(record.text("email"), "a@b.com");
    }

    #[test]
    fn test_is_deleted() {
        let mut record = Record::new(EntityKind::Reminder);
        assert!(!record.is_deleted());
        record.deleted = Some(Utc::now());
        assert!(record.is_deleted());
    }
}
