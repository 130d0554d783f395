//! Domain error types.

use thiserror::Error;

/// Top-level domain error type shared by every service.
///
/// Component-specific errors (bus, cache, registry, RPC) convert into this
/// type at crate boundaries so handlers only ever reason about one taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request or event failed domain validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller could not be authenticated.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller is authenticated but not allowed to perform the action.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No healthy instance of a dependency could be resolved.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A dependency was resolved but could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Whether retrying the same operation later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::Connection(_) | Self::Infrastructure(_)
        )
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Unauthorized(_) => "unauthorized",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Connection(_) => "connection_error",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }

    /// The message without the variant prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::Validation(m)
            | Self::Unauthenticated(m)
            | Self::Unauthorized(m)
            | Self::ServiceUnavailable(m)
            | Self::Connection(m)
            | Self::Infrastructure(m) => m,
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Infrastructure(format!("serialization failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(DomainError::Infrastructure("db down".into()).is_transient());
        assert!(DomainError::Connection("refused".into()).is_transient());
        assert!(DomainError::ServiceUnavailable("books".into()).is_transient());
    }

    #[test]
    fn test_permanent_errors_are_not_retryable() {
        assert!(!DomainError::Validation("title is required".into()).is_transient());
        assert!(!DomainError::NotFound("book 1".into()).is_transient());
        assert!(!DomainError::Unauthenticated("bad token".into()).is_transient());
        assert!(!DomainError::Unauthorized("not owner".into()).is_transient());
    }

    #[test]
    fn test_detail_strips_variant_prefix() {
        let err = DomainError::NotFound("author 42".into());

        assert_eq!(err.detail(), "author 42");
        assert_eq!(err.to_string(), "not found: author 42");
        assert_eq!(err.code(), "not_found");
    }
}
