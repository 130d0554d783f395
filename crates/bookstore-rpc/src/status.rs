//! Structured RPC error status.

use std::fmt;

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use bookstore_core::error::DomainError;

/// Error codes a service may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Code {
    /// The requested record does not exist.
    NotFound,
    /// The request was malformed or failed validation.
    InvalidArgument,
    /// Credentials were missing or wrong.
    Unauthenticated,
    /// The caller may not perform the call.
    PermissionDenied,
    /// A dependency of the service is unavailable.
    Unavailable,
    /// Anything else.
    Internal,
}

impl Code {
    /// HTTP status the code travels with.
    #[must_use]
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error body of a failed call: `{"code": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Error class.
    pub code: Code,
    /// Human-readable detail.
    pub message: String,
}

impl Status {
    /// Builds a status.
    #[must_use]
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}

impl IntoResponse for Status {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

impl From<DomainError> for Status {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(m) => Self::new(Code::NotFound, m),
            DomainError::Validation(m) => Self::new(Code::InvalidArgument, m),
            DomainError::Unauthenticated(m) => Self::new(Code::Unauthenticated, m),
            DomainError::Unauthorized(m) => Self::new(Code::PermissionDenied, m),
            DomainError::ServiceUnavailable(m) | DomainError::Connection(m) => {
                Self::new(Code::Unavailable, m)
            }
            DomainError::Infrastructure(m) => {
                error!(error = %m, "rpc handler failed");
                Self::new(Code::Internal, "internal error")
            }
        }
    }
}

impl From<Status> for DomainError {
    fn from(status: Status) -> Self {
        match status.code {
            Code::NotFound => Self::NotFound(status.message),
            Code::InvalidArgument => Self::Validation(status.message),
            Code::Unauthenticated => Self::Unauthenticated(status.message),
            Code::PermissionDenied => Self::Unauthorized(status.message),
            Code::Unavailable => Self::ServiceUnavailable(status.message),
            Code::Internal => Self::Infrastructure(status.message),
        }
    }
}

impl From<JsonRejection> for Status {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(Code::InvalidArgument, rejection.body_text())
    }
}

/// JSON extractor whose rejection is an `InvalidArgument` status.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(Status))]
pub struct RpcJson<T>(pub T);
