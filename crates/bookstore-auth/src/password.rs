//! Password hashing with Argon2id.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, SaltString};

use bookstore_core::error::DomainError;

/// Argon2id hasher and verifier.
#[derive(Clone, Default)]
pub struct Passwords {
    argon2: Argon2<'static>,
}

impl Passwords {
    /// Argon2id with the crate's recommended parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with minimal cost, for tests.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the parameters are rejected.
    pub fn low_cost() -> Result<Self, DomainError> {
        let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
            .map_err(|e| DomainError::Infrastructure(format!("argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes `password` with a fresh salt into PHC string format.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if hashing fails.
    pub async fn hash(&self, password: &str) -> Result<String, DomainError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| DomainError::Infrastructure(format!("password hashing failed: {e}")))
        })
        .await
        .map_err(|e| DomainError::Infrastructure(format!("password hashing task failed: {e}")))?
    }

    /// Whether `password` matches the PHC string `stored_hash`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if `stored_hash` is malformed.
    pub async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, DomainError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let stored_hash = stored_hash.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&stored_hash)
                .map_err(|e| DomainError::Infrastructure(format!("stored password hash is invalid: {e}")))?;
            match argon2.verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(password_hash::Error::Password) => Ok(false),
                Err(e) => Err(DomainError::Infrastructure(format!(
                    "password verification failed: {e}"
                ))),
            }
        })
        .await
        .map_err(|e| DomainError::Infrastructure(format!("password verification task failed: {e}")))?
    }
}
