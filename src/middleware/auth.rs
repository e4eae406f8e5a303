/// Authorization middleware
///
/// Resolves the Authorization header into a `CurrentUser` request extension:
/// bearer extraction, access-token decode, kind check, then a principal
/// lookup in the credential store. Refresh tokens are rejected here; the
/// revocation store is never consulted for access tokens.
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;

use crate::auth::{decode_token, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::store::{User, UserStore};

/// The authenticated principal, attached to the request by `AuthMiddleware`
/// and extracted in handlers with `web::ReqData<CurrentUser>`.
#[derive(Clone)]
pub struct CurrentUser(pub User);

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &header::HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Guards routes that require an authenticated user.
pub struct AuthMiddleware {
    jwt: JwtSettings,
    users: Arc<dyn UserStore>,
}

impl AuthMiddleware {
    pub fn new(jwt: JwtSettings, users: Arc<dyn UserStore>) -> Self {
        Self { jwt, users }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt: self.jwt.clone(),
            users: self.users.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt: JwtSettings,
    users: Arc<dyn UserStore>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt = self.jwt.clone();
        let users = self.users.clone();

        Box::pin(async move {
            let token = match bearer_token(req.headers()) {
                Some(token) => token,
                None => {
                    tracing::warn!("Missing or malformed Authorization header");
                    return Err(AppError::Auth(AuthError::MissingToken).into());
                }
            };

            let claims = match decode_token(&token, &jwt) {
                Ok(claims) => claims,
                Err(e) => {
                    tracing::warn!(error = %e, "Access token rejected");
                    return Err(AppError::Auth(AuthError::from(e)).into());
                }
            };

            if claims.kind != TokenKind::Access {
                tracing::warn!(kind = %claims.kind, "Non-access token on a protected route");
                return Err(AppError::Auth(AuthError::WrongTokenKind).into());
            }

            let user_id = match claims.user_id() {
                Ok(id) => id,
                Err(_) => return Err(AppError::Auth(AuthError::InvalidToken).into()),
            };

            let user = users
                .find_by_id(user_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| {
                    tracing::warn!(user_id = %user_id, "Token subject no longer exists");
                    AppError::Auth(AuthError::PrincipalNotFound)
                })?;

            tracing::debug!(user_id = %user.id, "Access token resolved");
            req.extensions_mut().insert(CurrentUser(user));

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderMap, HeaderValue, AUTHORIZATION};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_non_bearer_scheme_is_rejected() {
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers_with("abc.def.ghi")), None);
    }

    #[test]
    fn test_missing_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
