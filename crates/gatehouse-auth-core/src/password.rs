//! Password hashing with Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) so the
//! salt and parameters travel with the hash. Every call to [`CredentialVerifier::hash`]
//! draws a fresh salt: two hashes of the same password differ, and must never be
//! compared with `==`.

use argon2::{Argon2, Params, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::HashingError;

/// Longest password accepted for hashing, in bytes
pub const MAX_PASSWORD_BYTES: usize = 4096;

const SALT_LEN: usize = 16;

/// Hashes and checks passwords.
///
/// Stateless apart from its parameters; clone it freely into blocking tasks.
#[derive(Clone, Default)]
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
}

impl CredentialVerifier {
    /// Verifier with Argon2's default (OWASP-recommended) work factor
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifier with explicit Argon2id cost parameters
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }

    /// Hash a plaintext password into a PHC string.
    ///
    /// # Errors
    /// - [`HashingError::InputTooLong`] above [`MAX_PASSWORD_BYTES`]
    /// - [`HashingError::Entropy`] if the OS random source fails
    /// - [`HashingError::Primitive`] if Argon2 rejects the input
    pub fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashingError::InputTooLong {
                actual: plaintext.len(),
                maximum: MAX_PASSWORD_BYTES,
            });
        }

        let mut salt_bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| HashingError::Entropy(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| HashingError::Primitive(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| HashingError::Primitive(e.to_string()))?;
        Ok(phc.to_string())
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Returns `false` for a wrong password and equally for a corrupt or
    /// foreign hash; callers cannot tell the two apart.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        let parsed = match PasswordHash::new(hashed) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                return false;
            }
        };
        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}
