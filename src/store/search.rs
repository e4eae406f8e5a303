/// Search history store: one record per route comparison, owned by the
/// principal who ran it. Every query is scoped by `user_id`; a record is
/// invisible to anyone but its owner.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::routing::TransportMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Per-route figures persisted with a search. `geometry` is the provider's
/// GeoJSON, kept opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_hours: f64,
    pub co2_emissions_kg: f64,
    pub geometry: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    pub cargo_weight_kg: f64,
    pub transport_mode: TransportMode,
    pub shortest_route: RouteSummary,
    pub efficient_route: RouteSummary,
    pub created_at: DateTime<Utc>,
}

/// Input for `SearchStore::save`; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewSearch {
    pub user_id: Uuid,
    pub origin: RoutePoint,
    pub destination: RoutePoint,
    pub cargo_weight_kg: f64,
    pub transport_mode: TransportMode,
    pub shortest_route: RouteSummary,
    pub efficient_route: RouteSummary,
}

/// Listing window. `page` starts at 1; callers validate the bounds.
#[derive(Debug, Clone, Copy)]
pub struct SearchFilter {
    pub page: u32,
    pub limit: u32,
    pub newest_first: bool,
    pub mode: Option<TransportMode>,
}

impl SearchFilter {
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchStats {
    pub total_searches: i64,
    /// Sum over all records of shortest-route CO2 minus efficient-route CO2
    pub total_co2_saved: f64,
    pub avg_cargo_weight: f64,
}

#[async_trait]
pub trait SearchStore: Send + Sync {
    async fn save(&self, search: NewSearch) -> Result<SearchRecord, StoreError>;

    /// Returns the requested page and the total matching count.
    async fn list(
        &self,
        user_id: Uuid,
        filter: &SearchFilter,
    ) -> Result<(Vec<SearchRecord>, u64), StoreError>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<SearchRecord>, StoreError>;

    /// Removes the record, reporting whether it existed for this owner.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;

    async fn stats(&self, user_id: Uuid) -> Result<SearchStats, StoreError>;
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct PgSearchStore {
    pool: PgPool,
}

impl PgSearchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SearchRow {
    id: Uuid,
    user_id: Uuid,
    origin: Json<RoutePoint>,
    destination: Json<RoutePoint>,
    cargo_weight_kg: f64,
    transport_mode: String,
    shortest_route: Json<RouteSummary>,
    efficient_route: Json<RouteSummary>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SearchRow> for SearchRecord {
    type Error = StoreError;

    fn try_from(row: SearchRow) -> Result<Self, Self::Error> {
        let transport_mode = row
            .transport_mode
            .parse::<TransportMode>()
            .map_err(StoreError::Query)?;

        Ok(SearchRecord {
            id: row.id,
            user_id: row.user_id,
            origin: row.origin.0,
            destination: row.destination.0,
            cargo_weight_kg: row.cargo_weight_kg,
            transport_mode,
            shortest_route: row.shortest_route.0,
            efficient_route: row.efficient_route.0,
            created_at: row.created_at,
        })
    }
}

const SEARCH_COLUMNS: &str = "id, user_id, origin, destination, cargo_weight_kg, \
     transport_mode, shortest_route, efficient_route, created_at";

#[async_trait]
impl SearchStore for PgSearchStore {
    async fn save(&self, search: NewSearch) -> Result<SearchRecord, StoreError> {
        let row = sqlx::query_as::<_, SearchRow>(&format!(
            r#"
            INSERT INTO searches
                (user_id, origin, destination, cargo_weight_kg,
                 transport_mode, shortest_route, efficient_route)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SEARCH_COLUMNS
        ))
        .bind(search.user_id)
        .bind(Json(&search.origin))
        .bind(Json(&search.destination))
        .bind(search.cargo_weight_kg)
        .bind(search.transport_mode.as_str())
        .bind(Json(&search.shortest_route))
        .bind(Json(&search.efficient_route))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &SearchFilter,
    ) -> Result<(Vec<SearchRecord>, u64), StoreError> {
        let order = if filter.newest_first { "DESC" } else { "ASC" };

        let (rows, total): (Vec<SearchRow>, i64) = match filter.mode {
            Some(mode) => {
                let rows = sqlx::query_as::<_, SearchRow>(&format!(
                    "SELECT {} FROM searches \
                     WHERE user_id = $1 AND transport_mode = $2 \
                     ORDER BY created_at {} LIMIT $3 OFFSET $4",
                    SEARCH_COLUMNS, order
                ))
                .bind(user_id)
                .bind(mode.as_str())
                .bind(filter.limit as i64)
                .bind(filter.offset() as i64)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM searches WHERE user_id = $1 AND transport_mode = $2",
                )
                .bind(user_id)
                .bind(mode.as_str())
                .fetch_one(&self.pool)
                .await?;

                (rows, total)
            }
            None => {
                let rows = sqlx::query_as::<_, SearchRow>(&format!(
                    "SELECT {} FROM searches WHERE user_id = $1 \
                     ORDER BY created_at {} LIMIT $2 OFFSET $3",
                    SEARCH_COLUMNS, order
                ))
                .bind(user_id)
                .bind(filter.limit as i64)
                .bind(filter.offset() as i64)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM searches WHERE user_id = $1")
                        .bind(user_id)
                        .fetch_one(&self.pool)
                        .await?;

                (rows, total)
            }
        };

        let records = rows
            .into_iter()
            .map(SearchRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, total as u64))
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<SearchRecord>, StoreError> {
        let row = sqlx::query_as::<_, SearchRow>(&format!(
            "SELECT {} FROM searches WHERE id = $1 AND user_id = $2",
            SEARCH_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SearchRecord::try_from).transpose()
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM searches WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self, user_id: Uuid) -> Result<SearchStats, StoreError> {
        let (total_searches, total_co2_saved, avg_cargo_weight): (i64, f64, f64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM((shortest_route->>'co2_emissions_kg')::double precision
                               - (efficient_route->>'co2_emissions_kg')::double precision), 0),
                    COALESCE(AVG(cargo_weight_kg), 0)
                FROM searches
                WHERE user_id = $1
                "#,
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(SearchStats {
            total_searches,
            total_co2_saved: round2(total_co2_saved),
            avg_cargo_weight: round2(avg_cargo_weight),
        })
    }
}

/// Map-backed store for tests and local development.
#[derive(Default)]
pub struct InMemorySearchStore {
    inner: RwLock<HashMap<Uuid, SearchRecord>>,
}

impl InMemorySearchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchStore for InMemorySearchStore {
    async fn save(&self, search: NewSearch) -> Result<SearchRecord, StoreError> {
        let record = SearchRecord {
            id: Uuid::new_v4(),
            user_id: search.user_id,
            origin: search.origin,
            destination: search.destination,
            cargo_weight_kg: search.cargo_weight_kg,
            transport_mode: search.transport_mode,
            shortest_route: search.shortest_route,
            efficient_route: search.efficient_route,
            created_at: Utc::now(),
        };
        self.inner.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &SearchFilter,
    ) -> Result<(Vec<SearchRecord>, u64), StoreError> {
        let records = self.inner.read().await;

        let mut matching: Vec<SearchRecord> = records
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| filter.mode.map(|m| r.transport_mode == m).unwrap_or(true))
            .cloned()
            .collect();

        if filter.newest_first {
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        } else {
            matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();

        Ok((page, total))
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<SearchRecord>, StoreError> {
        let records = self.inner.read().await;
        Ok(records
            .get(&id)
            .filter(|r| r.user_id == user_id)
            .cloned())
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.inner.write().await;
        match records.get(&id) {
            Some(r) if r.user_id == user_id => {
                records.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn stats(&self, user_id: Uuid) -> Result<SearchStats, StoreError> {
        let records = self.inner.read().await;
        let owned: Vec<&SearchRecord> =
            records.values().filter(|r| r.user_id == user_id).collect();

        let total_searches = owned.len() as i64;
        let total_co2_saved: f64 = owned
            .iter()
            .map(|r| r.shortest_route.co2_emissions_kg - r.efficient_route.co2_emissions_kg)
            .sum();
        let avg_cargo_weight = if owned.is_empty() {
            0.0
        } else {
            owned.iter().map(|r| r.cargo_weight_kg).sum::<f64>() / owned.len() as f64
        };

        Ok(SearchStats {
            total_searches,
            total_co2_saved: round2(total_co2_saved),
            avg_cargo_weight: round2(avg_cargo_weight),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_search(user_id: Uuid, cargo_kg: f64, shortest_co2: f64, efficient_co2: f64) -> NewSearch {
        NewSearch {
            user_id,
            origin: RoutePoint {
                name: "Hamburg".to_string(),
                lat: 53.55,
                lng: 9.99,
            },
            destination: RoutePoint {
                name: "Munich".to_string(),
                lat: 48.14,
                lng: 11.58,
            },
            cargo_weight_kg: cargo_kg,
            transport_mode: TransportMode::Land,
            shortest_route: RouteSummary {
                distance_km: 600.0,
                duration_hours: 6.0,
                co2_emissions_kg: shortest_co2,
                geometry: serde_json::json!({"type": "LineString"}),
            },
            efficient_route: RouteSummary {
                distance_km: 650.0,
                duration_hours: 6.5,
                co2_emissions_kg: efficient_co2,
                geometry: serde_json::json!({"type": "LineString"}),
            },
        }
    }

    fn default_filter() -> SearchFilter {
        SearchFilter {
            page: 1,
            limit: 20,
            newest_first: true,
            mode: None,
        }
    }

    #[tokio::test]
    async fn save_assigns_id_and_timestamp() {
        let store = InMemorySearchStore::new();
        let user_id = Uuid::new_v4();

        let record = store.save(new_search(user_id, 1000.0, 40.0, 35.0)).await.unwrap();

        assert_eq!(record.user_id, user_id);
        let fetched = store.get(user_id, record.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, record.id);
    }

    #[tokio::test]
    async fn list_is_scoped_to_the_owner() {
        let store = InMemorySearchStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.save(new_search(alice, 1000.0, 40.0, 35.0)).await.unwrap();
        store.save(new_search(bob, 2000.0, 80.0, 70.0)).await.unwrap();

        let (records, total) = store.list(alice, &default_filter()).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, alice);
    }

    #[tokio::test]
    async fn pagination_windows_the_results() {
        let store = InMemorySearchStore::new();
        let user_id = Uuid::new_v4();
        for i in 0..7 {
            store
                .save(new_search(user_id, 1000.0 + i as f64, 40.0, 35.0))
                .await
                .unwrap();
        }

        let mut filter = default_filter();
        filter.limit = 3;

        let (page1, total) = store.list(user_id, &filter).await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(page1.len(), 3);

        filter.page = 3;
        let (page3, _) = store.list(user_id, &filter).await.unwrap();
        assert_eq!(page3.len(), 1);

        filter.page = 4;
        let (page4, _) = store.list(user_id, &filter).await.unwrap();
        assert!(page4.is_empty());
    }

    #[tokio::test]
    async fn mode_filter_narrows_the_listing() {
        let store = InMemorySearchStore::new();
        let user_id = Uuid::new_v4();

        let mut sea = new_search(user_id, 1000.0, 40.0, 35.0);
        sea.transport_mode = TransportMode::Sea;
        store.save(sea).await.unwrap();
        store.save(new_search(user_id, 2000.0, 80.0, 70.0)).await.unwrap();

        let mut filter = default_filter();
        filter.mode = Some(TransportMode::Sea);

        let (records, total) = store.list(user_id, &filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(records[0].transport_mode, TransportMode::Sea);
    }

    #[tokio::test]
    async fn delete_only_touches_the_owners_record() {
        let store = InMemorySearchStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let record = store.save(new_search(alice, 1000.0, 40.0, 35.0)).await.unwrap();

        assert!(!store.delete(bob, record.id).await.unwrap());
        assert!(store.delete(alice, record.id).await.unwrap());
        assert!(!store.delete(alice, record.id).await.unwrap());
    }

    #[tokio::test]
    async fn stats_aggregate_savings_and_cargo() {
        let store = InMemorySearchStore::new();
        let user_id = Uuid::new_v4();

        store.save(new_search(user_id, 1000.0, 40.0, 35.0)).await.unwrap();
        store.save(new_search(user_id, 3000.0, 100.0, 80.0)).await.unwrap();

        let stats = store.stats(user_id).await.unwrap();

        assert_eq!(stats.total_searches, 2);
        assert!((stats.total_co2_saved - 25.0).abs() < 1e-9);
        assert!((stats.avg_cargo_weight - 2000.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn stats_for_a_fresh_user_are_zero() {
        let store = InMemorySearchStore::new();

        let stats = store.stats(Uuid::new_v4()).await.unwrap();

        assert_eq!(stats.total_searches, 0);
        assert_eq!(stats.total_co2_saved, 0.0);
        assert_eq!(stats.avg_cargo_weight, 0.0);
    }
}
