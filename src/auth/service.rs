/// Auth service: registration, login, refresh rotation and logout over the
/// credential and revocation stores.
///
/// A refresh token is live while its `jti` entry exists in the revocation
/// store. Rotation consumes the entry and records the successor's, so each
/// refresh token can be redeemed exactly once. Access tokens carry no
/// server-side state and are validated purely by signature and expiry.
use std::sync::Arc;

use crate::auth::claims::TokenKind;
use crate::auth::jwt::{decode_token, issue_token};
use crate::auth::password::{hash_password, verify_password};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, StoreError};
use crate::store::{NewUser, RevocationStore, User, UserStore};

/// A fresh token pair together with the principal it belongs to.
#[derive(Debug)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
    jwt: JwtSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
        jwt: JwtSettings,
    ) -> Self {
        Self {
            users,
            revocations,
            jwt,
        }
    }

    /// Creates a principal. No tokens are issued; the caller logs in
    /// separately.
    ///
    /// # Errors
    /// `DuplicateEmail` when the email is already registered. Uniqueness is
    /// the store's unique index, not a preliminary lookup, so two
    /// concurrent registrations cannot both succeed.
    pub async fn register(
        &self,
        email: String,
        password: &str,
        full_name: String,
    ) -> Result<User, AppError> {
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .insert(NewUser {
                email,
                password_hash,
                full_name,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => AppError::Auth(AuthError::DuplicateEmail),
                other => AppError::Store(other),
            })?;

        tracing::info!(user_id = %user.id, "New user registered");
        Ok(user)
    }

    /// Verifies credentials and issues a token pair.
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown email and for a wrong password
    /// alike; the two cases are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let tokens = self.issue_session(user).await?;
        tracing::info!(user_id = %tokens.user.id, "User logged in");
        Ok(tokens)
    }

    /// Redeems a refresh token for a fresh pair, consuming it.
    ///
    /// The new pair is issued from the stored principal, not from the
    /// presented token's claims, so a stale email in an old token never
    /// propagates.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AppError> {
        let claims = decode_token(refresh_token, &self.jwt).map_err(AuthError::from)?;

        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::WrongTokenKind.into());
        }

        if !self.revocations.exists(&claims.jti).await? {
            return Err(AuthError::RevokedToken.into());
        }

        // The delete count is the single-use gate: of concurrent refreshes
        // with the same token, exactly one sees true here.
        if !self.revocations.delete(&claims.jti).await? {
            return Err(AuthError::RevokedToken.into());
        }

        let user_id = claims.user_id().map_err(|_| AuthError::InvalidToken)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        let tokens = self.issue_session(user).await?;
        tracing::info!(user_id = %tokens.user.id, "Refresh token rotated");
        Ok(tokens)
    }

    /// Revokes the presented refresh token. Never fails: an undecodable or
    /// already-dead token leaves the same end state as a live one, namely
    /// no entry in the revocation store.
    pub async fn logout(&self, refresh_token: &str) {
        match decode_token(refresh_token, &self.jwt) {
            Ok(claims) => match self.revocations.delete(&claims.jti).await {
                Ok(revoked) => {
                    tracing::info!(user_id = %claims.sub, revoked = revoked, "User logged out");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Revocation store unavailable during logout");
                }
            },
            Err(e) => {
                tracing::debug!(error = %e, "Logout with an undecodable token");
            }
        }
    }

    /// Issues an access/refresh pair and records the refresh token's jti.
    /// The entry's TTL is the token's own remaining validity, so the store
    /// entry and the embedded expiry die together.
    async fn issue_session(&self, user: User) -> Result<AuthTokens, AppError> {
        let access = issue_token(
            &user.id,
            &user.email,
            TokenKind::Access,
            self.jwt.access_token_expiry_minutes,
            &self.jwt,
        )?;
        let refresh = issue_token(
            &user.id,
            &user.email,
            TokenKind::Refresh,
            self.jwt.refresh_token_expiry_minutes,
            &self.jwt,
        )?;

        self.revocations
            .put(
                &refresh.claims.jti,
                user.id,
                refresh.claims.seconds_until_expiry(),
            )
            .await?;

        Ok(AuthTokens {
            access_token: access.token,
            refresh_token: refresh.token,
            user,
        })
    }
}
