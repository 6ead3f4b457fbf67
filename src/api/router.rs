//! API router.
//!
//! Middleware stack (outermost → innermost):
//! 1. CORS → 2. Request logger → Handler

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router with every route under `/api/`.
pub fn api_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/health-report", post(endpoints::health_report::generate))
        .route("/chat", post(endpoints::chat::send))
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(axum::middleware::from_fn(middleware::audit::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
