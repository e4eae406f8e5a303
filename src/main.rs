use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use sqlx::postgres::PgPoolOptions;

use cargoroute::configuration::get_configuration;
use cargoroute::routing::MapboxClient;
use cargoroute::startup::run;
use cargoroute::store::{PgSearchStore, PgUserStore, RedisRevocationStore};
use cargoroute::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    tracing::info!("Connecting to the database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
    })?;
    tracing::info!("Database ready");

    tracing::info!("Connecting to the revocation store");
    let redis_client = redis::Client::open(configuration.redis.url.as_str()).map_err(|e| {
        tracing::error!("Invalid redis url: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Redis configuration error")
    })?;
    let redis_config = ConnectionManagerConfig::new()
        .set_connection_timeout(Duration::from_secs(5))
        .set_response_timeout(Duration::from_secs(2));
    let redis_conn = ConnectionManager::new_with_config(redis_client, redis_config)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to redis: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Redis connection error",
            )
        })?;
    tracing::info!("Revocation store ready");

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(configuration.directions.timeout_seconds))
        .build()
        .map_err(|e| {
            tracing::error!("Failed to build http client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Http client error")
        })?;

    let users = Arc::new(PgUserStore::new(pool.clone()));
    let revocations = Arc::new(RedisRevocationStore::new(redis_conn));
    let searches = Arc::new(PgSearchStore::new(pool));
    let directions = Arc::new(MapboxClient::new(http_client, &configuration.directions));

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on {}", address);

    let server = run(
        listener,
        users,
        revocations,
        searches,
        directions,
        configuration.jwt.clone(),
    )?;

    server.await
}
