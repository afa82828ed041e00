use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

use crate::error::AppError;

/// Prefix markers identifying bcrypt-family hashes.
const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];
/// Prefix marker identifying Argon2-family hashes (argon2i/argon2d/argon2id).
const ARGON2_PREFIX: &str = "$argon2";

/// looks_hashed
///
/// Classifies a stored credential value: true iff it carries one of the known
/// adaptive-hash markers. Anything else is treated as a legacy plaintext row.
pub fn looks_hashed(stored: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p)) || stored.starts_with(ARGON2_PREFIX)
}

/// verify
///
/// Pure predicate: does the supplied plaintext match the stored credential?
///
/// Hash-marked values delegate to the scheme's own constant-time comparison
/// and never touch the equality branch. Unmarked values fall back to exact
/// byte equality — a deprecated compatibility mode kept only so legacy rows
/// can still log in; no new plaintext is ever written, and a successful
/// legacy verify does not rehash the row.
pub fn verify(plain: &str, stored: &str) -> bool {
    if stored.starts_with(ARGON2_PREFIX) {
        return match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        };
    }

    if BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p)) {
        return bcrypt::verify(plain, stored).unwrap_or(false);
    }

    // Deprecated: legacy plaintext rows.
    stored.as_bytes() == plain.as_bytes()
}

/// hash_password
///
/// Hashes a new or updated password with bcrypt at the default cost. All
/// credential writes go through here.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST).map_err(|e| {
        tracing::error!("password hashing failed: {:?}", e);
        AppError::Internal
    })
}
