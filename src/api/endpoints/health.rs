//! Liveness probe for load balancers and monitoring.

use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, RequestId};
use crate::config;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// `GET /health` — unauthenticated liveness probe.
pub async fn check(
    State(ctx): State<ApiContext>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<Envelope<HealthStatus>>, ApiError> {
    let database = {
        let conn = ctx.db()?;
        match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
            Ok(_) => "reachable",
            Err(_) => "unreachable",
        }
    };

    Ok(Json(Envelope::new(
        HealthStatus {
            status: "ok",
            version: config::APP_VERSION,
            database,
        },
        &request_id,
    )))
}
