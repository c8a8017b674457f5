//! HTTP router setup.

use crate::chain::ChainClient;
use crate::handlers;
use crate::middleware::inject_request_id;
use crate::state::AppState;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{self, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the application router.
pub fn create<C: ChainClient>(state: Arc<AppState<C>>) -> Router {
    let cors_layer = cors_layer(&state.config.cors_origin_list());
    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(handlers::health::<C>))
        .route("/status", get(handlers::status::<C>))
        .route("/metrics", get(handlers::metrics))
        .route("/relay", post(handlers::relay::<C>))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(inject_request_id)))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        info!("CORS: Allowing all origins (*)");
        return base.allow_origin(cors::Any);
    }

    info!("CORS: Restricting to {:?}", origins);
    let origins: Vec<_> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    base.allow_origin(origins)
}
