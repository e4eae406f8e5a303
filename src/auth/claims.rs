/// JWT claims payload (RFC 7519).
///
/// Access and refresh tokens share one claim set; the `type` claim tells
/// them apart and the `jti` claim keys refresh tokens in the revocation
/// store.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Discriminates access tokens from refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// User email at issuance time (informational; not re-validated)
    pub email: String,
    /// Token kind
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Unique token ID; revocation-store key for refresh tokens
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring `ttl_minutes` from now, with a fresh `jti`.
    pub fn new(user_id: Uuid, email: String, kind: TokenKind, ttl_minutes: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email,
            kind,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl_minutes * 60,
        }
    }

    /// Extract the user ID from the subject claim
    ///
    /// # Errors
    /// Returns error if the subject is not a valid UUID
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Internal("Invalid user ID in token".to_string()))
    }

    /// Seconds until the embedded expiry; zero or negative once expired.
    /// Doubles as the revocation-store TTL so both layers agree.
    pub fn seconds_until_expiry(&self) -> i64 {
        self.exp - chrono::Utc::now().timestamp()
    }
}
