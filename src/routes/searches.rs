/// Search history routes
///
/// Paginated listing, stats, retrieval, and deletion of a user's past
/// route comparisons. Every operation is scoped to the authenticated
/// principal; another user's records are indistinguishable from absent
/// ones.
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, ValidationError};
use crate::middleware::CurrentUser;
use crate::routing::TransportMode;
use crate::store::{SearchFilter, SearchRecord, SearchStore};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub mode: Option<String>,
}

#[derive(Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

#[derive(Serialize)]
pub struct SearchPage {
    pub data: Vec<SearchRecord>,
    pub pagination: Pagination,
}

fn parse_filter(query: &ListQuery) -> Result<SearchFilter, ValidationError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    if page == 0 {
        return Err(ValidationError::OutOfRange(
            "page must be at least 1".to_string(),
        ));
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ValidationError::OutOfRange(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let newest_first = match query.sort.as_deref() {
        None | Some("-created_at") => true,
        Some("created_at") => false,
        Some(_) => {
            return Err(ValidationError::OutOfRange(
                "sort must be created_at or -created_at".to_string(),
            ))
        }
    };

    let mode = match query.mode.as_deref() {
        None => None,
        Some(raw) => Some(
            raw.parse::<TransportMode>()
                .map_err(|_| ValidationError::InvalidFormat("mode".to_string()))?,
        ),
    };

    Ok(SearchFilter {
        page,
        limit,
        newest_first,
        mode,
    })
}

fn build_pagination(filter: &SearchFilter, total: u64) -> Pagination {
    let limit = u64::from(filter.limit);
    let total_pages = if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    };
    Pagination {
        page: filter.page,
        limit: filter.limit,
        total,
        total_pages,
        has_next: u64::from(filter.page) < total_pages,
    }
}

/// GET /searches
///
/// The authenticated user's search history, newest first by default.
///
/// # Errors
/// - 400: page below 1, limit outside 1..=100, unknown sort key, or an
///   unknown transport mode filter
pub async fn list_searches(
    query: web::Query<ListQuery>,
    user: web::ReqData<CurrentUser>,
    searches: web::Data<dyn SearchStore>,
) -> Result<HttpResponse, AppError> {
    let filter = parse_filter(&query)?;

    let (data, total) = searches.list(user.id, &filter).await?;
    let pagination = build_pagination(&filter, total);

    Ok(HttpResponse::Ok().json(SearchPage { data, pagination }))
}

/// GET /searches/stats
///
/// Aggregates over the user's history. A user with no searches gets
/// zeroes, not an error.
pub async fn search_stats(
    user: web::ReqData<CurrentUser>,
    searches: web::Data<dyn SearchStore>,
) -> Result<HttpResponse, AppError> {
    let stats = searches.stats(user.id).await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// GET /searches/{id}
///
/// # Errors
/// - 404: No such record, or it belongs to another user
pub async fn get_search(
    path: web::Path<Uuid>,
    user: web::ReqData<CurrentUser>,
    searches: web::Data<dyn SearchStore>,
) -> Result<HttpResponse, AppError> {
    let record = searches
        .get(user.id, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Search".to_string()))?;

    Ok(HttpResponse::Ok().json(record))
}

/// DELETE /searches/{id}
///
/// Returns 204 with no body once the record is gone.
///
/// # Errors
/// - 404: No such record, or it belongs to another user
pub async fn delete_search(
    path: web::Path<Uuid>,
    user: web::ReqData<CurrentUser>,
    searches: web::Data<dyn SearchStore>,
) -> Result<HttpResponse, AppError> {
    let deleted = searches.delete(user.id, path.into_inner()).await?;
    if !deleted {
        return Err(AppError::NotFound("Search".to_string()));
    }

    Ok(HttpResponse::NoContent().finish())
}
