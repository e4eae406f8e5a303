/// Authentication routes
///
/// Registration, login, refresh-token rotation, logout, and the current
/// principal. Refresh and logout read the refresh token from the
/// `Authorization: Bearer` header rather than the body.
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthService, AuthTokens};
use crate::error::{AppError, AuthError};
use crate::middleware::{bearer_token, CurrentUser};
use crate::store::User;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a principal; never includes the password hash.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

/// Token pair issued on login and refresh
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "bearer".to_string(),
            user: UserResponse::from(&tokens.user),
        }
    }
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub detail: String,
}

/// POST /auth/register
///
/// Register a new user with email, password, and full name. Returns the
/// created principal; the client logs in separately to obtain tokens.
///
/// # Errors
/// - 400: Validation errors (malformed email, empty name or password)
/// - 400: Email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let full_name = is_valid_name(&form.full_name)?;
    is_valid_password(&form.password)?;

    let user = auth.register(email, &form.password, full_name).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

/// POST /auth/login
///
/// Authenticate with email and password and receive an access/refresh
/// token pair.
///
/// # Errors
/// - 401: Invalid credentials; an unknown email and a wrong password
///   produce the same response
pub async fn login(
    form: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let tokens = auth.login(&form.email, &form.password).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// POST /auth/refresh
///
/// Exchange a refresh token (bearer header) for a fresh pair. The
/// presented token is consumed; replaying it fails.
///
/// # Errors
/// - 401: Missing, malformed, expired, revoked, or non-refresh token, or
///   a principal that no longer exists
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(req.headers()).ok_or(AuthError::MissingToken)?;

    let tokens = auth.refresh(&token).await?;

    Ok(HttpResponse::Ok().json(TokenResponse::from(tokens)))
}

/// POST /auth/logout
///
/// Revoke the presented refresh token. Always succeeds: a missing,
/// garbage, or already-revoked token ends in the same state.
pub async fn logout(req: HttpRequest, auth: web::Data<AuthService>) -> HttpResponse {
    if let Some(token) = bearer_token(req.headers()) {
        auth.logout(&token).await;
    } else {
        tracing::debug!("Logout without a bearer token");
    }

    HttpResponse::Ok().json(LogoutResponse {
        detail: "Logged out successfully".to_string(),
    })
}

/// GET /auth/me
///
/// The principal resolved from the access token by the auth middleware.
pub async fn me(user: web::ReqData<CurrentUser>) -> HttpResponse {
    let user = user.into_inner();
    HttpResponse::Ok().json(UserResponse::from(&user.0))
}
