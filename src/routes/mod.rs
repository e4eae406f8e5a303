mod auth;
mod health_check;
mod planner;
mod searches;

pub use auth::{login, logout, me, refresh, register};
pub use health_check::health_check;
pub use planner::calculate;
pub use searches::{delete_search, get_search, list_searches, search_stats};

use actix_web::{HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::error::ErrorResponse;

/// Fallback for unknown paths; answers with the same JSON envelope as
/// application errors.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    let error_id = Uuid::new_v4().to_string();
    tracing::debug!(error_id = %error_id, path = %req.path(), "Unknown route");

    HttpResponse::NotFound().json(ErrorResponse::new(
        error_id,
        format!("{} not found", req.path()),
        "NOT_FOUND".to_string(),
        404,
    ))
}
