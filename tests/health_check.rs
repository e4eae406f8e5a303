//! Liveness probe smoke test.

use std::net::TcpListener;
use std::sync::Arc;

use cargoroute::configuration::JwtSettings;
use cargoroute::error::DirectionsError;
use cargoroute::routing::{DirectionsProvider, DirectionsRoute};
use cargoroute::startup::run;
use cargoroute::store::{
    InMemoryRevocationStore, InMemorySearchStore, InMemoryUserStore, RevocationStore, RoutePoint,
    SearchStore, UserStore,
};

struct NoDirections;

#[async_trait::async_trait]
impl DirectionsProvider for NoDirections {
    async fn directions(
        &self,
        _origin: &RoutePoint,
        _destination: &RoutePoint,
    ) -> Result<Vec<DirectionsRoute>, DirectionsError> {
        Err(DirectionsError::NoRoute)
    }
}

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let revocations: Arc<dyn RevocationStore> = Arc::new(InMemoryRevocationStore::new());
    let searches: Arc<dyn SearchStore> = Arc::new(InMemorySearchStore::new());
    let jwt = JwtSettings {
        secret: "integration-test-secret".to_string(),
        access_token_expiry_minutes: 15,
        refresh_token_expiry_minutes: 60,
    };

    let server = run(
        listener,
        users,
        revocations,
        searches,
        Arc::new(NoDirections),
        jwt,
    )
    .expect("Failed to build server");
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(format!("{}/health_check", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}
