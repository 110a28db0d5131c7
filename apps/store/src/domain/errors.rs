use std::fmt;

use thiserror::Error;

/// Broad category of a store failure, used by adapters to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input failed model validation or violated a store precondition
    Invalid,
    /// The requested row does not exist
    NotFound,
    /// A uniqueness constraint rejected the write
    Conflict,
    /// The database or the store itself failed
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Invalid => write!(f, "invalid"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Uniform error returned by every store operation and by model validation
///
/// `location` names the operation that failed (e.g. `SqlTeamStore.Save`),
/// `message` is safe to show to a user and `details` carries identifiers
/// plus any driver error text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct AppError {
    pub location: String,
    pub kind: ErrorKind,
    pub message: String,
    pub details: String,
}

impl AppError {
    pub fn new(
        location: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            kind,
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn invalid(
        location: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(location, ErrorKind::Invalid, message, details)
    }

    pub fn not_found(
        location: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(location, ErrorKind::NotFound, message, details)
    }

    pub fn conflict(
        location: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(location, ErrorKind::Conflict, message, details)
    }

    pub fn internal(
        location: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::new(location, ErrorKind::Internal, message, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_location_and_message() {
        let err = AppError::not_found("SqlTeamStore.Get", "We couldn't find the existing team", "id=abc");

        assert_eq!(err.to_string(), "SqlTeamStore.Get: We couldn't find the existing team");
        assert_eq!(err.details, "id=abc");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn constructors_set_kind() {
        assert_eq!(AppError::invalid("a", "b", "").kind, ErrorKind::Invalid);
        assert_eq!(AppError::conflict("a", "b", "").kind, ErrorKind::Conflict);
        assert_eq!(AppError::internal("a", "b", "").kind, ErrorKind::Internal);
    }

    #[test]
    fn kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::Conflict.to_string(), "conflict");
    }
}
