/// Authentication module
///
/// Token codec, password hashing and the auth service that ties them to the
/// credential and revocation stores.
mod claims;
mod jwt;
mod password;
mod service;

pub use claims::{Claims, TokenKind};
pub use jwt::{decode_token, issue_token, IssuedToken};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, AuthTokens};
