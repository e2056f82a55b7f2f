//! Portal API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Versioned routes live under `/api/v1` behind the principal middleware;
//! the unauthenticated `/health` probe sits beside them. Request
//! correlation and CORS wrap everything.

use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

pub fn portal_router(ctx: ApiContext) -> Router {
    // Principal-protected routes. The gateway has already authenticated the
    // caller; requests without its headers never reach a handler.
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route(
            "/patients/me",
            get(endpoints::patients::profile).put(endpoints::patients::update_profile),
        )
        .route("/patients/me/dashboard", get(endpoints::dashboard::snapshot))
        .route("/patients/me/appointments", get(endpoints::appointments::list))
        .route("/patients/me/lab-results", get(endpoints::labs::list))
        .route("/patients/me/medications", get(endpoints::medications::list))
        .route(
            "/patients/me/messages",
            get(endpoints::messages::list).post(endpoints::messages::create),
        )
        .route("/messages/:id", patch(endpoints::messages::mark_read))
        .route("/health-alerts/:id", patch(endpoints::alerts::mark_read))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::principal::require_principal));

    // Unauthenticated liveness probe
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .nest("/api/v1", protected)
        .merge(public)
        .layer(axum::middleware::from_fn(middleware::request_id::correlate))
        .layer(CorsLayer::permissive())
}
