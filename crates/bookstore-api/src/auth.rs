//! Bearer tokens: issuing, verifying and the per-request extractor.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use bookstore_core::error::DomainError;
use bookstore_core::model::{User, UserRole};

use crate::error::ApiError;
use crate::state::AppState;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<UserRole>,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    /// Whether the bearer holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&UserRole::Admin)
    }
}

/// Signs and checks HS256 tokens with one shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Creates an issuer whose tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issues a token for `user` at `now`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if signing fails.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, DomainError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            iat,
            exp: iat.saturating_add(ttl),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::Infrastructure(format!("token signing failed: {e}")))
    }

    /// Checks the signature of `token` and that it has not expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthenticated` for a forged, malformed or
    /// expired token.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, DomainError> {
        // Expiry is checked against the injected clock below.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                debug!(error = %e, "rejected bearer token");
                DomainError::Unauthenticated("invalid token".into())
            })?
            .claims;
        if claims.exp <= now.timestamp() {
            return Err(DomainError::Unauthenticated("token expired".into()));
        }
        Ok(claims)
    }
}

/// The caller identified by a valid `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DomainError::Unauthenticated("user is not authenticated".into()))?;

        let claims = state.tokens.verify(token, state.clock.now())?;
        Ok(Self(claims))
    }
}

/// Allows the call when the caller is user `id` or an admin.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` otherwise.
pub fn ensure_same_user_or_admin(caller: &Claims, id: &str) -> Result<(), DomainError> {
    if caller.sub == id || caller.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Unauthorized(
            "user id does not match the requested id".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn ada(roles: Vec<UserRole>) -> User {
        User {
            id: "u-1".to_owned(),
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            first_name: None,
            last_name: None,
            roles,
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("s3cret", Duration::from_secs(3600))
    }

    #[test]
    fn test_issued_token_verifies_with_claims() {
        // Arrange
        let tokens = issuer();
        let token = tokens.issue(&ada(vec![UserRole::Admin]), now()).unwrap();

        // Act
        let claims = tokens.verify(&token, now()).unwrap();

        // Assert
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "ada");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(claims.is_admin());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = issuer();
        let token = tokens.issue(&ada(vec![]), now()).unwrap();

        let result = tokens.verify(&token, now() + chrono::Duration::hours(2));

        assert_eq!(
            result.unwrap_err(),
            DomainError::Unauthenticated("token expired".into())
        );
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let token = TokenIssuer::new("other", Duration::from_secs(3600))
            .issue(&ada(vec![]), now())
            .unwrap();

        let result = issuer().verify(&token, now());

        assert!(matches!(result, Err(DomainError::Unauthenticated(_))));
    }

    #[test]
    fn test_same_user_or_admin_rule() {
        let owner = issuer()
            .verify(&issuer().issue(&ada(vec![]), now()).unwrap(), now())
            .unwrap();
        let admin = Claims {
            sub: "u-9".to_owned(),
            roles: vec![UserRole::Admin],
            ..owner.clone()
        };
        let stranger = Claims {
            sub: "u-2".to_owned(),
            ..owner.clone()
        };

        assert!(ensure_same_user_or_admin(&owner, "u-1").is_ok());
        assert!(ensure_same_user_or_admin(&admin, "u-1").is_ok());
        assert!(matches!(
            ensure_same_user_or_admin(&stranger, "u-1"),
            Err(DomainError::Unauthorized(_))
        ));
    }
}
