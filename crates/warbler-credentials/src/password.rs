//! Secret hashing and verification using Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{CredentialError, CredentialResult};

/// A well-formed hash that no secret verifies against, with the default
/// Argon2id cost parameters. Verifying against it costs the same as a real
/// verification.
pub(crate) const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a secret with a fresh random salt.
///
/// Returns the PHC-formatted hash string, which embeds the salt and cost
/// parameters.
pub fn hash_secret(secret: &str) -> CredentialResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Verify a secret against a stored PHC hash.
pub fn verify_secret(secret: &str, hash: &str) -> CredentialResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| CredentialError::Hash(format!("invalid hash format: {e}")))?;
    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok())
}
