//! Typed entity views
//!
//! Concrete projections of a generic [`Record`] for the code paths that
//! need real types: authentication, the notification scheduler, status
//! resolution.

use chrono::{DateTime, Utc};

use crate::fields::FieldValue;
use crate::record::Record;

/// Lifecycle status reference data (`statuses` table)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub title: String,
}

impl Status {
    /// Well-known name of the live state
    pub const ACTIVE: &'static str = "active";
    /// Well-known name of the soft-deleted state
    pub const INACTIVE: &'static str = "inactive";

    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            name: record.text("name").to_string(),
            title: record.text("title").to_string(),
        }
    }
}

/// A registered user (`users` table)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub password_hash: String,
    /// Ordered set of opaque device tokens
    pub push_tokens: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            first_name: record.text("first_name").to_string(),
            second_name: record.text("second_name").to_string(),
            email: record.text("email").to_string(),
            password_hash: record.text("password_hash").to_string(),
            push_tokens: decode_push_tokens(record.text("push_tokens")),
            created: record.created,
            updated: record.updated,
        }
    }
}

/// Parse the serialized device-token list; anything unreadable counts
/// as "no tokens registered".
pub fn decode_push_tokens(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_default()
}

/// Serialize a device-token list back to its stored form.
pub fn encode_push_tokens(tokens: &[String]) -> FieldValue {
    let text = serde_json::to_string(tokens).unwrap_or_else(|_| "[]".to_string());
    FieldValue::Text(text)
}

/// A scheduled reminder (`reminders` table)
#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    /// Trigger instant, canonical RFC 3339 text
    pub date_time: String,
    /// Sticky: once true the scheduler never dispatches again
    pub is_notified: bool,
    pub user_id: Option<i64>,
}

impl Reminder {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id,
            title: record.text("title").to_string(),
            date_time: record.text("date_time").to_string(),
            is_notified: record.flag("is_notified"),
            user_id: record.user_id,
        }
    }

    /// The trigger instant, when the stored text parses.
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date_time)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Seconds from `now` until the trigger instant. Negative when the
    /// reminder is already overdue, `None` when the instant is unreadable.
    pub fn seconds_until_due(&self, now: DateTime<Utc>) -> Option<i64> {
        self.due_at().map(|due| (due - now).num_seconds())
    }
}

/// An auxiliary counter (`counters` table)
#[derive(Debug, Clone)]
pub struct Counter {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub date_time: String,
    pub is_system: bool,
    pub user_id: Option<i64>,
}

impl Counter {
    pub fn from_record(record: &Record) -> Self {
        let mut name = record.text("name").to_string();
        // Persisted per-user counters are stored with a "{user_id}-" name
        // prefix; the view exposes the bare name. System counters keep
        // their name verbatim.
        if record.id != 0 && !record.flag("is_system") {
            if let Some(owner) = record.user_id {
                if let Some(stripped) = name.strip_prefix(&format!("{owner}-")) {
                    name = stripped.to_string();
                }
            }
        }

        Self {
            id: record.id,
            name,
            title: record.text("title").to_string(),
            date_time: record.text("date_time").to_string(),
            is_system: record.flag("is_system"),
            user_id: record.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::RawFields;
    use crate::schema::EntityKind;
    use chrono::TimeZone;

    fn reminder_record(date_time: &str) -> Record {
        let mut raw = RawFields::new();
        raw.insert("title".to_string(), "Dentist".into());
        raw.insert("date_time".to_string(), date_time.into());
        Record::from_raw(EntityKind::Reminder, &raw)
    }

    #[test]
    fn test_reminder_seconds_until_due() {
        let reminder = Reminder::from_record(&reminder_record("2024-03-01T12:30:00.000Z"));
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 28, 0).unwrap();
        assert_eq!(reminder.seconds_until_due(now), Some(120));

        let later = Utc.with_ymd_and_hms(2024, 3, 1, 13, 0, 0).unwrap();
        assert_eq!(reminder.seconds_until_due(later), Some(-1800));
    }

    #[test]
    fn test_reminder_unparseable_instant() {
        let mut record = reminder_record("2024-03-01T12:30:00.000Z");
        record.set_value("date_time", FieldValue::Text("garbage".into()));
        let reminder = Reminder::from_record(&record);
        assert_eq!(reminder.seconds_until_due(Utc::now()), None);
    }

    #[test]
    fn test_push_token_round_trip() {
        assert!(decode_push_tokens("").is_empty());
        assert!(decode_push_tokens("not json").is_empty());

        let tokens = vec!["tok-a".to_string(), "tok-b".to_string()];
        let encoded = encode_push_tokens(&tokens);
        let FieldValue::Text(text) = &encoded else {
            panic!("expected text value");
        };
        assert_eq!(decode_push_tokens(text), tokens);
    }

    #[test]
    fn test_user_from_record() {
        let mut raw = RawFields::new();
        raw.insert("first_name".to_string(), "Lena".into());
        raw.insert("second_name".to_string(), "Orlova".into());
        raw.insert("email".to_string(), "lena@example.com".into());
        raw.insert("push_tokens".to_string(), r#"["tok-1"]"#.into());
        let record = Record::from_raw(EntityKind::User, &raw);

        let user = User::from_record(&record);
        assert_eq!(user.email, "lena@example.com");
        assert_eq!(user.push_tokens, vec!["tok-1".to_string()]);
    }

    #[test]
    fn test_counter_strips_owner_prefix() {
        let mut raw = RawFields::new();
        raw.insert("id".to_string(), FieldValue::Int(3));
        raw.insert("name".to_string(), "12-water".into());
        raw.insert("title".to_string(), "Water".into());
        let mut record = Record::from_raw(EntityKind::Counter, &raw);
        record.user_id = Some(12);

        assert_eq!(Counter::from_record(&record).name, "water");

        // system counters keep the stored name
        record.set_value("is_system", FieldValue::Bool(true));
        assert_eq!(Counter::from_record(&record).name, "12-water");
    }
}
