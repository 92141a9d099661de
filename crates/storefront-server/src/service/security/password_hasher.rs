//! Password hashing and verification using Argon2id.
//!
//! Methods return handler errors so they can be used directly from HTTP
//! handlers.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as ArgonError, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier};

use crate::handler::{ErrorKind, Result};

/// Tracing target for password hashing.
const TRACING_TARGET_PASSWORD_HASHER: &str = "storefront_server::service::password_hasher";

/// Argon2id password hasher with default parameters.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Creates a new instance of the [`PasswordHasher`] service.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Hashes a password with a fresh random salt.
    ///
    /// Returns a PHC string that embeds the algorithm, parameters and salt,
    /// suitable for storing in a [`CustomerProfile`].
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InternalServerError`] if hashing fails.
    ///
    /// [`CustomerProfile`]: storefront_core::types::CustomerProfile
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    error = %e,
                    "Password hashing operation failed"
                );

                ErrorKind::InternalServerError
                    .with_context("Hash generation error")
                    .with_resource("authentication")
            })?;

        Ok(password_hash.to_string())
    }

    /// Verifies a password against a stored PHC hash.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidCredentials`] for a wrong password
    /// - [`ErrorKind::InternalServerError`] for a malformed hash or system error
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
            tracing::warn!(
                target: TRACING_TARGET_PASSWORD_HASHER,
                error = %e,
                "Invalid password hash format stored"
            );

            ErrorKind::InternalServerError
                .with_context("Hash format error")
                .with_resource("authentication")
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    "Password verification successful"
                );
                Ok(())
            }
            Err(ArgonError::Password) => {
                tracing::debug!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    "Password verification failed: incorrect password provided"
                );
                Err(ErrorKind::InvalidCredentials.into_error())
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_PASSWORD_HASHER,
                    error = %e,
                    "Password verification system error"
                );
                Err(ErrorKind::InternalServerError
                    .with_context("Verification error")
                    .with_resource("authentication"))
            }
        }
    }

    /// Runs a verification against a throwaway hash and returns `false`.
    ///
    /// Called when no profile exists for an email so that unknown accounts take
    /// as long to reject as wrong passwords.
    pub fn verify_dummy_password(&self, password: &str) -> bool {
        let dummy_password = uuid::Uuid::new_v4().simple().to_string();

        if let Ok(dummy_hash) = self.hash_password(&dummy_password) {
            let _ = self.verify_password(password, &dummy_hash);
        }

        false
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
