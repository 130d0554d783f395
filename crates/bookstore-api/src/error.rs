//! Bookstore gateway error types.

use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use bookstore_core::error::DomainError;
use bookstore_rpc::RpcError;
use bookstore_runtime::RuntimeError;

/// Startup errors for the gateway binaries.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration, telemetry, backend or server failure.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The RPC client could not be built.
    #[error("rpc client error: {0}")]
    Rpc(#[from] RpcError),
}

impl From<bookstore_runtime::config::ConfigError> for AppError {
    fn from(err: bookstore_runtime::config::ConfigError) -> Self {
        Self::Runtime(err.into())
    }
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: &'static str,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl ApiError {
    /// Login failures. A malformed request and an unknown user read the same
    /// as a wrong password.
    #[must_use]
    pub fn login(err: DomainError) -> Self {
        match err {
            DomainError::Validation(_)
            | DomainError::NotFound(_)
            | DomainError::Unauthenticated(_) => Self(
                DomainError::Unauthenticated("invalid username or password".into()),
            ),
            other => Self(other),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::Validation(rejection.body_text()))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self(DomainError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            DomainError::Unauthorized(_) => StatusCode::FORBIDDEN,
            DomainError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            DomainError::Connection(_) => StatusCode::BAD_GATEWAY,
            DomainError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if let DomainError::Infrastructure(detail) = &self.0 {
            error!(error = %detail, "request failed");
            "internal server error".to_owned()
        } else {
            self.0.detail().to_owned()
        };

        let body = ErrorBody {
            error: message,
            code: self.0.code(),
        };

        (status, Json(body)).into_response()
    }
}

/// JSON extractor whose rejection is a 400 `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Form extractor whose rejection is a 400 `ApiError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::Value;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    async fn body_of(err: ApiError) -> Value {
        let response = err.into_response();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::NotFound("book b-1".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_auth_failures_map_to_401_and_403() {
        assert_eq!(
            status_of(DomainError::Unauthenticated("no token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(DomainError::Unauthorized("not yours".into())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_dependency_failures_map_to_503_and_502() {
        assert_eq!(
            status_of(DomainError::ServiceUnavailable("books".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(DomainError::Connection("refused".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_infrastructure_detail_is_not_returned() {
        // Arrange
        let err = ApiError(DomainError::Infrastructure("password for db is hunter2".into()));

        // Act
        let body = body_of(err).await;

        // Assert
        assert_eq!(body["error"], "internal server error");
        assert_eq!(body["code"], "infrastructure_error");
    }

    #[tokio::test]
    async fn test_login_hides_unknown_user() {
        let unknown = ApiError::login(DomainError::NotFound("user bob not found".into()));
        let wrong = ApiError::login(DomainError::Unauthenticated("invalid credentials".into()));

        let unknown_body = body_of(unknown).await;
        let wrong_body = body_of(wrong).await;

        assert_eq!(unknown_body["code"], "unauthenticated");
        assert_eq!(unknown_body["error"], "invalid username or password");
        assert_eq!(wrong_body, unknown_body);
        assert!(
            ApiError::login(DomainError::ServiceUnavailable("auth".into()))
                .0
                .is_transient()
        );
    }
}
