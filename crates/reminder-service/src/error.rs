//! Service layer error types

use reminder_core::DomainError;
use thiserror::Error;

/// Service layer error type
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Domain rule violation, passed through unchanged
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Authentication failure. Deliberately does not distinguish an
    /// unknown email from a wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Input rejected before it reached the store
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_passes_through() {
        let err = ServiceError::from(DomainError::EntityNotFound {
            kind: "reminder",
            id: 7,
        });
        assert_eq!(err.to_string(), "reminder with id '7' not found");
    }

    #[test]
    fn test_invalid_credentials_reveals_nothing() {
        let err = ServiceError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid email or password");
    }
}
