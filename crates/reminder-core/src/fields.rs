//! Scalar field values - the vocabulary of raw row data
//!
//! Raw input (deserialized request bodies, decoded database rows) is a
//! mapping from field name to [`FieldValue`]. Schemas declare a
//! [`FieldType`] per field and values are coerced into it on projection.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

/// Raw field data: a mapping from field name to scalar value.
pub type RawFields = BTreeMap<String, FieldValue>;

/// Declared storage type of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Int,
    Bool,
}

/// A single scalar value as carried in raw field data
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Int(i64),
    Bool(bool),
    /// A date value supplied by a caller. Never stored as-is: projection
    /// onto a `Text` field normalizes it to its RFC 3339 string.
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// The default value a missing field is projected to.
    pub fn default_for(ty: FieldType) -> Self {
        match ty {
            FieldType::Text => Self::Text(String::new()),
            FieldType::Int => Self::Int(0),
            FieldType::Bool => Self::Bool(false),
        }
    }

    /// Coerce a raw value into the declared field type.
    ///
    /// A `DateTime` supplied for a `Text` field becomes its canonical
    /// RFC 3339 representation (millisecond precision, `Z` offset).
    /// Int/Bool are interchangeable the way tinyint-backed booleans are.
    /// Anything else that does not match the declared type falls back to
    /// the type default; validation catches what matters afterwards.
    pub fn coerce(self, ty: FieldType) -> Self {
        match (ty, self) {
            (_, Self::Null) => Self::Null,
            (FieldType::Text, Self::Text(s)) => Self::Text(s),
            (FieldType::Text, Self::DateTime(dt)) => {
                Self::Text(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            (FieldType::Int, Self::Int(n)) => Self::Int(n),
            (FieldType::Int, Self::Bool(b)) => Self::Int(i64::from(b)),
            (FieldType::Bool, Self::Bool(b)) => Self::Bool(b),
            (FieldType::Bool, Self::Int(n)) => Self::Bool(n != 0),
            (ty, _) => Self::default_for(ty),
        }
    }

    /// View as text, if this is a non-null text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// View as integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// View as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// True for `Null` and for empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        assert_eq!(
            FieldValue::default_for(FieldType::Text),
            FieldValue::Text(String::new())
        );
        assert_eq!(FieldValue::default_for(FieldType::Int), FieldValue::Int(0));
        assert_eq!(
            FieldValue::default_for(FieldType::Bool),
            FieldValue::Bool(false)
        );
    }

    #[test]
    fn test_datetime_normalizes_to_rfc3339_text() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let coerced = FieldValue::DateTime(dt).coerce(FieldType::Text);
        assert_eq!(
            coerced,
            FieldValue::Text("2024-03-01T12:30:00.000Z".to_string())
        );
    }

    #[test]
    fn test_int_bool_interchange() {
        assert_eq!(
            FieldValue::Int(1).coerce(FieldType::Bool),
            FieldValue::Bool(true)
        );
        assert_eq!(
            FieldValue::Bool(true).coerce(FieldType::Int),
            FieldValue::Int(1)
        );
    }

    #[test]
    fn test_mismatch_falls_back_to_default() {
        assert_eq!(
            FieldValue::Text("abc".into()).coerce(FieldType::Int),
            FieldValue::Int(0)
        );
        assert_eq!(
            FieldValue::Int(7).coerce(FieldType::Text),
            FieldValue::Text(String::new())
        );
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(FieldValue::Null.coerce(FieldType::Text), FieldValue::Null);
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::Text(String::new()).is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
    }
}
