mod directions;
mod emissions;
mod service;

pub use directions::{DirectionsProvider, DirectionsRoute, MapboxClient};
pub use emissions::{EmissionModel, TransportMode};
pub use service::{EfficientRoute, RouteComparison, RouteService, Savings};
