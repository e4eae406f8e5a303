/// Route planning routes
///
/// A comparison request carries two named points, a cargo weight, and a
/// transport mode. The response pairs the shortest candidate with the most
/// efficient one and reports the CO2 saved by taking the latter.
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, ValidationError};
use crate::middleware::CurrentUser;
use crate::routing::{RouteService, TransportMode};
use crate::store::RoutePoint;

#[derive(Deserialize)]
pub struct CalculateRequest {
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    pub cargo_weight_kg: f64,
    pub transport_mode: TransportMode,
}

/// POST /routes/calculate
///
/// Compare candidate routes between origin and destination and record the
/// search under the authenticated user.
///
/// # Errors
/// - 400: Non-positive cargo weight
/// - 404: No route exists between the points
/// - 502: Directions provider failure
pub async fn calculate(
    form: web::Json<CalculateRequest>,
    user: web::ReqData<CurrentUser>,
    planner: web::Data<RouteService>,
) -> Result<HttpResponse, AppError> {
    if form.cargo_weight_kg <= 0.0 {
        return Err(ValidationError::OutOfRange(
            "cargo_weight_kg must be greater than zero".to_string(),
        )
        .into());
    }

    let request = form.into_inner();
    let comparison = planner
        .calculate(
            user.id,
            request.origin,
            request.destination,
            request.cargo_weight_kg,
            request.transport_mode,
        )
        .await?;

    Ok(HttpResponse::Ok().json(comparison))
}
