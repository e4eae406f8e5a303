/// Token codec: HS256 signing and validation for access and refresh tokens.
///
/// Purely computational; the codec never touches a store. Revocation and
/// principal checks happen in the auth service and the authorization
/// middleware.
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, TokenError};

/// A freshly signed token together with the claims baked into it, so
/// callers can read `jti` and the expiry without decoding their own output.
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Sign a token of the given kind for a user
///
/// # Errors
/// Returns error if signing fails (malformed secret)
pub fn issue_token(
    user_id: &Uuid,
    email: &str,
    kind: TokenKind,
    ttl_minutes: i64,
    config: &JwtSettings,
) -> Result<IssuedToken, AppError> {
    let claims = Claims::new(*user_id, email.to_string(), kind, ttl_minutes);

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

    Ok(IssuedToken { token, claims })
}

/// Validate signature and expiry, returning the embedded claims.
///
/// Expiry is checked without leeway: a token is valid strictly until its
/// `exp` timestamp. An expired token is reported apart from every other
/// failure (bad signature, malformed input, wrong algorithm).
pub fn decode_token(token: &str, config: &JwtSettings) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(TokenError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry_minutes: 60,
            refresh_token_expiry_minutes: 10080,
        }
    }

    #[test]
    fn test_issue_and_decode_round_trip() {
        let config = get_test_config();
        let user_id = Uuid::new_v4();
        let email = "test@example.com";

        let issued = issue_token(&user_id, email, TokenKind::Access, 60, &config)
            .expect("Failed to issue token");
        let claims = decode_token(&issued.token, &config).expect("Failed to decode token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, email);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.jti, issued.claims.jti);
        assert_eq!(claims.exp, issued.claims.exp);
    }

    #[test]
    fn test_refresh_kind_survives_round_trip() {
        let config = get_test_config();
        let issued = issue_token(
            &Uuid::new_v4(),
            "test@example.com",
            TokenKind::Refresh,
            10080,
            &config,
        )
        .expect("Failed to issue token");

        let claims = decode_token(&issued.token, &config).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let config = get_test_config();
        let issued = issue_token(
            &Uuid::new_v4(),
            "test@example.com",
            TokenKind::Access,
            -5,
            &config,
        )
        .expect("Failed to issue token");

        let result = decode_token(&issued.token, &config);
        assert_eq!(result.unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_malformed_token_is_invalid_not_expired() {
        let config = get_test_config();
        let result = decode_token("invalid.token.here", &config);

        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let config = get_test_config();
        let issued = issue_token(
            &Uuid::new_v4(),
            "test@example.com",
            TokenKind::Access,
            60,
            &config,
        )
        .expect("Failed to issue token");

        let tampered = format!("{}X", issued.token);
        assert_eq!(decode_token(&tampered, &config).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let config = get_test_config();
        let issued = issue_token(
            &Uuid::new_v4(),
            "test@example.com",
            TokenKind::Access,
            60,
            &config,
        )
        .expect("Failed to issue token");

        let mut other = get_test_config();
        other.secret = "another-secret-key-that-does-not-match".to_string();

        assert_eq!(
            decode_token(&issued.token, &other).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_invalid() {
        // Signature is checked before expiry; a tampered expired token must
        // not be mistaken for a merely expired one.
        let config = get_test_config();
        let issued = issue_token(
            &Uuid::new_v4(),
            "test@example.com",
            TokenKind::Refresh,
            -5,
            &config,
        )
        .expect("Failed to issue token");

        let tampered = format!("{}X", issued.token);
        assert_eq!(decode_token(&tampered, &config).unwrap_err(), TokenError::Invalid);
    }
}
