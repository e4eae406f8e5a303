pub mod auth;
pub mod configuration;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod routing;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
