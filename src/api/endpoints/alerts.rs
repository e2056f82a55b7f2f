//! Health alert endpoints.

use axum::extract::{Path, State};
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::parse_uuid;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, Principal, RequestId};
use crate::db;
use crate::models::HealthAlert;

#[derive(Deserialize)]
pub struct MarkReadRequest {
    pub is_read: bool,
}

/// `PATCH /api/v1/health-alerts/:id` — same contract as message mark-read.
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Path(alert_id): Path<String>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<Envelope<HealthAlert>>, ApiError> {
    if !request.is_read {
        return Err(ApiError::Validation("alerts can only be marked read".into()));
    }

    let alert_id = parse_uuid(&alert_id, "alert id")?;

    let conn = ctx.db()?;
    let alert = db::get_health_alert(&conn, &alert_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Alert {alert_id} not found")))?;

    if !principal.may_access(&alert.patient_id) {
        return Err(ApiError::NotFound(format!("Alert {alert_id} not found")));
    }

    db::mark_alert_read(&conn, &alert_id, chrono::Utc::now().naive_utc())
        .map_err(ApiError::from)?;
    let updated = db::get_health_alert(&conn, &alert_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Alert {alert_id} not found")))?;

    Ok(Json(Envelope::new(updated, &request_id)))
}
