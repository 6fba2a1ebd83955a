use axum::{http::Method, middleware, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::rate_limit::rate_limit_middleware;
use super::{handlers, pokemon};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Authenticated and rate limited
    let catalog_routes = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/pokemon", get(pokemon::list_pokemon))
        .route("/pokemon/search", get(pokemon::search_pokemon))
        .route("/pokemon/{id}", get(pokemon::get_pokemon))
        .route("/index", get(pokemon::list_index))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(catalog_routes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(metrics_middleware)),
        )
        .with_state(state)
}
