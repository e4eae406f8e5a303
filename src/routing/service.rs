/// Route comparison: fetch candidate routes, estimate CO2 for each, pick
/// the shortest and the most efficient candidate, persist the search, and
/// report the savings between the two picks.
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, DirectionsError};
use crate::routing::directions::{DirectionsProvider, DirectionsRoute};
use crate::routing::emissions::{EmissionModel, TransportMode};
use crate::store::{NewSearch, RoutePoint, RouteSummary, SearchStore};

#[derive(Debug, Serialize)]
pub struct Savings {
    pub co2_saved_kg: f64,
    pub percentage: f64,
}

/// The efficient pick plus what it saves over the shortest pick. The route
/// fields are flattened so the two route objects in a comparison read the
/// same on the wire.
#[derive(Debug, Serialize)]
pub struct EfficientRoute {
    #[serde(flatten)]
    pub route: RouteSummary,
    pub savings: Savings,
}

#[derive(Debug, Serialize)]
pub struct RouteComparison {
    pub search_id: Uuid,
    pub shortest_route: RouteSummary,
    pub efficient_route: EfficientRoute,
}

#[derive(Clone)]
pub struct RouteService {
    directions: Arc<dyn DirectionsProvider>,
    searches: Arc<dyn SearchStore>,
    emissions: EmissionModel,
}

impl RouteService {
    pub fn new(
        directions: Arc<dyn DirectionsProvider>,
        searches: Arc<dyn SearchStore>,
        emissions: EmissionModel,
    ) -> Self {
        Self {
            directions,
            searches,
            emissions,
        }
    }

    /// Compares candidate routes between two points and records the search.
    ///
    /// Distances, durations and emissions are stored as computed; only the
    /// savings figures in the response are rounded to two decimals.
    pub async fn calculate(
        &self,
        user_id: Uuid,
        origin: RoutePoint,
        destination: RoutePoint,
        cargo_weight_kg: f64,
        transport_mode: TransportMode,
    ) -> Result<RouteComparison, AppError> {
        let candidates = self.directions.directions(&origin, &destination).await?;

        let summaries: Vec<RouteSummary> = candidates
            .into_iter()
            .map(|route| self.summarize(route, cargo_weight_kg, transport_mode))
            .collect();

        tracing::info!(
            user_id = %user_id,
            mode = %transport_mode,
            candidates = summaries.len(),
            "Comparing route candidates"
        );

        let shortest = summaries
            .iter()
            .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
            .cloned()
            .ok_or(DirectionsError::NoRoute)?;
        let efficient = summaries
            .iter()
            .min_by(|a, b| a.co2_emissions_kg.total_cmp(&b.co2_emissions_kg))
            .cloned()
            .ok_or(DirectionsError::NoRoute)?;

        let record = self
            .searches
            .save(NewSearch {
                user_id,
                origin,
                destination,
                cargo_weight_kg,
                transport_mode,
                shortest_route: shortest.clone(),
                efficient_route: efficient.clone(),
            })
            .await?;

        tracing::info!(search_id = %record.id, "Route comparison saved");

        let savings = compare_savings(&shortest, &efficient);

        Ok(RouteComparison {
            search_id: record.id,
            shortest_route: shortest,
            efficient_route: EfficientRoute {
                route: efficient,
                savings,
            },
        })
    }

    fn summarize(
        &self,
        route: DirectionsRoute,
        cargo_weight_kg: f64,
        transport_mode: TransportMode,
    ) -> RouteSummary {
        let distance_km = route.distance / 1000.0;
        let duration_hours = route.duration / 3600.0;
        let co2_emissions_kg = self
            .emissions
            .estimate(transport_mode, distance_km, cargo_weight_kg);
        RouteSummary {
            distance_km,
            duration_hours,
            co2_emissions_kg,
            geometry: route.geometry,
        }
    }
}

fn compare_savings(shortest: &RouteSummary, efficient: &RouteSummary) -> Savings {
    let co2_saved_kg = shortest.co2_emissions_kg - efficient.co2_emissions_kg;
    let percentage = if shortest.co2_emissions_kg > 0.0 {
        co2_saved_kg / shortest.co2_emissions_kg * 100.0
    } else {
        0.0
    };
    Savings {
        co2_saved_kg: round2(co2_saved_kg),
        percentage: round2(percentage),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySearchStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct StubDirections {
        routes: Vec<DirectionsRoute>,
    }

    #[async_trait]
    impl DirectionsProvider for StubDirections {
        async fn directions(
            &self,
            _origin: &RoutePoint,
            _destination: &RoutePoint,
        ) -> Result<Vec<DirectionsRoute>, DirectionsError> {
            Ok(self.routes.clone())
        }
    }

    fn route(distance_m: f64, duration_s: f64) -> DirectionsRoute {
        DirectionsRoute {
            distance: distance_m,
            duration: duration_s,
            geometry: json!({"type": "LineString", "coordinates": []}),
        }
    }

    fn point(name: &str) -> RoutePoint {
        RoutePoint {
            name: name.to_string(),
            lat: 37.5,
            lng: 126.9,
        }
    }

    fn service_with_routes(
        routes: Vec<DirectionsRoute>,
    ) -> (RouteService, Arc<InMemorySearchStore>) {
        let searches = Arc::new(InMemorySearchStore::new());
        let service = RouteService::new(
            Arc::new(StubDirections { routes }),
            searches.clone(),
            EmissionModel::default(),
        );
        (service, searches)
    }

    #[tokio::test]
    async fn test_summaries_convert_units_and_apply_the_mode_factor() {
        let (service, _) = service_with_routes(vec![route(90_000.0, 5_400.0)]);

        let comparison = service
            .calculate(
                Uuid::new_v4(),
                point("Seoul"),
                point("Busan"),
                1_000.0,
                TransportMode::Land,
            )
            .await
            .unwrap();

        let shortest = &comparison.shortest_route;
        assert_eq!(shortest.distance_km, 90.0);
        assert_eq!(shortest.duration_hours, 1.5);
        // 90 km * 1 tonne * 0.062
        assert!((shortest.co2_emissions_kg - 5.58).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_picks_minimum_distance_and_minimum_emissions() {
        let (service, _) = service_with_routes(vec![
            route(120_000.0, 4_000.0),
            route(90_000.0, 5_400.0),
            route(150_000.0, 3_600.0),
        ]);

        let comparison = service
            .calculate(
                Uuid::new_v4(),
                point("Seoul"),
                point("Busan"),
                500.0,
                TransportMode::Land,
            )
            .await
            .unwrap();

        // One mode per request means emissions track distance, so both
        // picks land on the 90 km candidate and the savings are zero.
        assert_eq!(comparison.shortest_route.distance_km, 90.0);
        assert_eq!(comparison.efficient_route.route.distance_km, 90.0);
        assert_eq!(comparison.efficient_route.savings.co2_saved_kg, 0.0);
        assert_eq!(comparison.efficient_route.savings.percentage, 0.0);
    }

    #[tokio::test]
    async fn test_persists_the_search_under_the_requesting_user() {
        let user_id = Uuid::new_v4();
        let (service, searches) =
            service_with_routes(vec![route(120_000.0, 4_000.0), route(90_000.0, 5_400.0)]);

        let comparison = service
            .calculate(
                user_id,
                point("Seoul"),
                point("Busan"),
                2_000.0,
                TransportMode::Sea,
            )
            .await
            .unwrap();

        let filter = crate::store::SearchFilter {
            page: 1,
            limit: 20,
            newest_first: true,
            mode: None,
        };
        let (records, total) = searches.list(user_id, &filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(records[0].id, comparison.search_id);
        assert_eq!(records[0].cargo_weight_kg, 2_000.0);
        assert_eq!(records[0].transport_mode, TransportMode::Sea);
        assert_eq!(records[0].origin.name, "Seoul");
        assert_eq!(records[0].shortest_route.distance_km, 90.0);
        assert_eq!(records[0].efficient_route.distance_km, 90.0);
    }

    #[tokio::test]
    async fn test_no_candidates_is_a_no_route_error() {
        let (service, searches) = service_with_routes(vec![]);
        let user_id = Uuid::new_v4();

        let result = service
            .calculate(
                user_id,
                point("Seoul"),
                point("Busan"),
                1_000.0,
                TransportMode::Land,
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::Directions(DirectionsError::NoRoute))
        ));
        let filter = crate::store::SearchFilter {
            page: 1,
            limit: 20,
            newest_first: true,
            mode: None,
        };
        let (_, total) = searches.list(user_id, &filter).await.unwrap();
        assert_eq!(total, 0, "a failed comparison must not be recorded");
    }

    #[tokio::test]
    async fn test_zero_distance_routes_do_not_divide_by_zero() {
        let (service, _) = service_with_routes(vec![route(0.0, 0.0)]);

        let comparison = service
            .calculate(
                Uuid::new_v4(),
                point("Here"),
                point("Here"),
                1_000.0,
                TransportMode::Air,
            )
            .await
            .unwrap();

        assert_eq!(comparison.efficient_route.savings.co2_saved_kg, 0.0);
        assert_eq!(comparison.efficient_route.savings.percentage, 0.0);
    }
}
