use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::JwtSettings;
use crate::middleware::{AuthMiddleware, CorrelationMiddleware};
use crate::routes::{
    calculate, delete_search, get_search, health_check, list_searches, login, logout, me,
    not_found, refresh, register, search_stats,
};
use crate::routing::{DirectionsProvider, EmissionModel, RouteService};
use crate::store::{RevocationStore, SearchStore, UserStore};

/// Builds the HTTP server on an already-bound listener.
///
/// Stores and the directions provider come in as trait objects, so tests
/// can run the full HTTP surface against in-memory backends.
pub fn run(
    listener: TcpListener,
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
    searches: Arc<dyn SearchStore>,
    directions: Arc<dyn DirectionsProvider>,
    jwt: JwtSettings,
) -> Result<Server, std::io::Error> {
    let auth_service = web::Data::new(AuthService::new(
        users.clone(),
        revocations,
        jwt.clone(),
    ));
    let route_service = web::Data::new(RouteService::new(
        directions,
        searches.clone(),
        EmissionModel::default(),
    ));
    let search_store = web::Data::from(searches);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(CorrelationMiddleware)

            // Shared state
            .app_data(auth_service.clone())
            .app_data(route_service.clone())
            .app_data(search_store.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/logout", web::post().to(logout))
                    .service(
                        web::resource("/me")
                            .wrap(AuthMiddleware::new(jwt.clone(), users.clone()))
                            .route(web::get().to(me)),
                    ),
            )

            // Protected routes (require a valid access token)
            .service(
                web::scope("/routes")
                    .wrap(AuthMiddleware::new(jwt.clone(), users.clone()))
                    .route("/calculate", web::post().to(calculate)),
            )
            .service(
                web::scope("/searches")
                    .wrap(AuthMiddleware::new(jwt.clone(), users.clone()))
                    .route("", web::get().to(list_searches))
                    // registered ahead of /{id} so "stats" never parses as an id
                    .route("/stats", web::get().to(search_stats))
                    .route("/{id}", web::get().to(get_search))
                    .route("/{id}", web::delete().to(delete_search)),
            )

            // Unknown paths answer JSON, not an empty body
            .default_service(web::route().to(not_found))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
