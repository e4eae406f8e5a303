/// Password hashing and verification with bcrypt.
///
/// There is no strength policy here: any password the handlers accept is
/// hashed as-is. Verification of a wrong password is a `false`, not an
/// error; an error means the stored hash itself is unusable.
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

/// Hash a password using bcrypt with the default cost
///
/// # Errors
/// Returns error if bcrypt hashing fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its stored hash
///
/// # Errors
/// Returns error only when the stored hash is malformed; a mismatched
/// password yields `Ok(false)`
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
