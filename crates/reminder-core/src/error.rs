//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    /// The requested row does not exist (or is not visible under the
    /// requested status/owner scope).
    #[error("{kind} with id '{id}' not found")]
    EntityNotFound { kind: &'static str, id: i64 },

    /// A well-known status row is missing. This is a deployment
    /// precondition and should abort initialization, never surface
    /// per-request.
    #[error("Status not found: {0}")]
    StatusNotFound(&'static str),

    /// Field rule violations, one human-readable message per violation.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Any underlying store failure. The cause is logged at the wrap
    /// site and never carried across the trust boundary.
    #[error("Sorry, storage error")]
    Storage,
}

impl DomainError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. } | Self::StatusNotFound(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::EntityNotFound {
            kind: "reminder",
            id: 42,
        };
        assert_eq!(err.to_string(), "reminder with id '42' not found");

        let err = DomainError::Validation(vec![
            "The title field is required.".to_string(),
            "The date_time must be a valid timestamp.".to_string(),
        ]);
        assert!(err.to_string().contains("title field is required"));
        assert!(err.to_string().contains("; "));
    }

    #[test]
    fn test_storage_error_is_opaque() {
        // The Display output must never include storage internals.
        assert_eq!(DomainError::Storage.to_string(), "Sorry, storage error");
    }

    #[test]
    fn test_classifiers() {
        assert!(DomainError::EntityNotFound { kind: "user", id: 1 }.is_not_found());
        assert!(DomainError::StatusNotFound("active").is_not_found());
        assert!(DomainError::Validation(vec![]).is_validation());
        assert!(!DomainError::Storage.is_not_found());
        assert!(!DomainError::Storage.is_validation());
    }
}
