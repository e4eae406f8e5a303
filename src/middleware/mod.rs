/// Middleware module
///
/// Authorization resolution and request correlation.
mod auth;
mod correlation;

pub use auth::{bearer_token, AuthMiddleware, CurrentUser};
pub use correlation::CorrelationMiddleware;
