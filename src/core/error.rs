use std::fmt;
use thiserror::Error;

/// A single failed validation rule reported by a `validate` callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Stable error identifier (e.g. `errors.required`).
    pub id: String,
    /// Field the error refers to, if any.
    pub path: Option<String>,
    /// Human readable message.
    pub message: String,
}

impl ValidationError {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} ({}): {}", self.id, path, self.message),
            None => write!(f, "{}: {}", self.id, self.message),
        }
    }
}

fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_document(document_id: &Option<String>) -> String {
    match document_id {
        Some(id) => format!(" on document '{id}'"),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("Operation '{operation}' not allowed{}", describe_document(.document_id))]
    AuthorizationDenied {
        operation: String,
        document_id: Option<String>,
    },

    #[error("Document not found for operation '{operation}'{}", describe_document(.document_id))]
    NotFound {
        operation: String,
        document_id: Option<String>,
    },

    #[error("Validation failed: {}", join_validation_errors(.0))]
    ValidationFailed(Vec<ValidationError>),

    #[error("Collection '{0}' not found in context")]
    CollectionNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Callback '{0}' is not registered")]
    CallbackNotRegistered(String),

    #[error("Callback '{name}' expects a {expected} hook")]
    CallbackPhaseMismatch { name: String, expected: String },

    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl MutationError {
    /// Returns true for errors raised before any persistence attempt.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::AuthorizationDenied { .. } | Self::NotFound { .. } | Self::ValidationFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MutationError>;

impl<T> From<std::sync::PoisonError<T>> for MutationError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for MutationError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_message_mentions_document() {
        let err = MutationError::AuthorizationDenied {
            operation: "Posts.update".into(),
            document_id: Some("p1".into()),
        };
        assert_eq!(
            err.to_string(),
            "Operation 'Posts.update' not allowed on document 'p1'"
        );
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = MutationError::ValidationFailed(vec![
            ValidationError::new("errors.required", "title is required").at("title"),
            ValidationError::new("errors.max", "too long"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: errors.required (title): title is required; errors.max: too long"
        );
        assert!(err.is_rejection());
    }

    #[test]
    fn test_storage_error_is_not_a_rejection() {
        assert!(!MutationError::Storage("disk".into()).is_rejection());
    }
}
