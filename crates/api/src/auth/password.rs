//! Password hashing
//!
//! New hashes are Argon2id PHC strings. Verification also accepts bcrypt
//! hashes (`$2a$`, `$2b$`, `$2y$`) carried over from the previous deployment.

use std::sync::OnceLock;

use argon2::password_hash::{
    rand_core::{OsRng, RngCore},
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error("Stored hash is malformed: {0}")]
    MalformedHash(String),
    #[error("Unsupported hash format")]
    UnsupportedFormat,
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
///
/// Returns `Ok(false)` on mismatch. Errors are reserved for hashes that
/// cannot be parsed or whose format is not recognized.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    if stored_hash.starts_with("$argon2") {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        return match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        };
    }

    if BCRYPT_PREFIXES.iter().any(|p| stored_hash.starts_with(p)) {
        return Ok(pwhash::bcrypt::verify(password, stored_hash));
    }

    Err(PasswordError::UnsupportedFormat)
}

/// Generate a hash that no password can match
///
/// The input is 32 random bytes that are discarded, so the hash is
/// well-formed but unreachable.
pub fn generate_impossible_hash() -> Result<String, PasswordError> {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(&secret, &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Hash used to burn an equivalent verification when the principal is unknown
pub(crate) fn timing_dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| {
        generate_impossible_hash().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to generate timing dummy hash");
            String::new()
        })
    })
}
