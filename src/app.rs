use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::{
    middleware::{rate_limiter, security_headers},
    routes::{grid, health, session, websocket},
    state::AppState,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// CORS policy for the configured origins
///
/// # Errors
///
/// Returns an error if an origin is not a valid header value
pub fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Build the router with every route and middleware layer
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Grid
        .route(
            "/api/grid",
            get(grid::get_grid).layer(CompressionLayer::new()),
        )
        .route("/api/blocks/claim", post(grid::claim_block))
        .route("/api/stats", get(grid::get_stats))
        // Sessions
        .route(
            "/api/session",
            post(session::create_session)
                .get(session::current_session)
                .delete(session::end_session),
        )
        // WebSocket
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state)
        // Add middleware layers (applied in reverse order)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(
                    security_headers::security_headers_middleware,
                ))
                .layer(middleware::from_fn(rate_limiter::rate_limit_middleware))
                .layer(cors)
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
}
