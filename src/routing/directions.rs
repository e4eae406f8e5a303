/// Directions provider: candidate routes between two points.
///
/// `MapboxClient` talks to the Mapbox Directions v5 API (or any compatible
/// endpoint via `base_url`). The trait seam lets tests substitute canned
/// routes without a network.
use async_trait::async_trait;
use serde::Deserialize;

use crate::configuration::DirectionsSettings;
use crate::error::DirectionsError;
use crate::store::RoutePoint;

/// Mapbox profile used for road routing.
const DRIVING_PROFILE: &str = "driving-traffic";

/// One candidate route as the provider reports it: distance in meters,
/// duration in seconds, geometry as opaque GeoJSON.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsRoute {
    pub distance: f64,
    pub duration: f64,
    pub geometry: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    code: String,
}

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Returns at least one candidate route or an error; an empty result
    /// from the provider surfaces as `DirectionsError::NoRoute`.
    async fn directions(
        &self,
        origin: &RoutePoint,
        destination: &RoutePoint,
    ) -> Result<Vec<DirectionsRoute>, DirectionsError>;
}

#[derive(Clone)]
pub struct MapboxClient {
    http_client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl MapboxClient {
    pub fn new(http_client: reqwest::Client, settings: &DirectionsSettings) -> Self {
        Self {
            http_client,
            base_url: settings.base_url.clone(),
            access_token: settings.access_token.clone(),
        }
    }
}

fn routes_from_body(body: DirectionsResponse) -> Result<Vec<DirectionsRoute>, DirectionsError> {
    match body.code.as_str() {
        "Ok" if !body.routes.is_empty() => Ok(body.routes),
        "Ok" | "NoRoute" | "NoSegment" => Err(DirectionsError::NoRoute),
        other => Err(DirectionsError::Request(format!(
            "directions service answered with code {}",
            other
        ))),
    }
}

#[async_trait]
impl DirectionsProvider for MapboxClient {
    async fn directions(
        &self,
        origin: &RoutePoint,
        destination: &RoutePoint,
    ) -> Result<Vec<DirectionsRoute>, DirectionsError> {
        // Mapbox takes coordinates in lng,lat order
        let url = format!(
            "{}/{}/{},{};{},{}",
            self.base_url, DRIVING_PROFILE, origin.lng, origin.lat, destination.lng, destination.lat
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("alternatives", "true"),
                ("geometries", "geojson"),
                ("overview", "full"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Directions request failed: {}", e);
                DirectionsError::Request(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::error!(status = status, "Directions service returned an error");
            return Err(DirectionsError::UpstreamStatus(status));
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| DirectionsError::Request(e.to_string()))?;

        routes_from_body(body)
    }
}
