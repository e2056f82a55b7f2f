//! Medication list endpoint.

use std::str::FromStr;

use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::scoped_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, Principal, RequestId};
use crate::db;
use crate::models::enums::MedicationStatus;
use crate::models::{Medication, MedicationFilter};

#[derive(Deserialize)]
pub struct MedicationListQuery {
    pub status: Option<String>,
    pub patient_id: Option<String>,
}

/// `GET /api/v1/patients/me/medications` — optionally filtered by status.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<MedicationListQuery>,
) -> Result<Json<Envelope<Vec<Medication>>>, ApiError> {
    let patient_id = scoped_patient(&principal, &query.patient_id)?;

    let status = match &query.status {
        Some(raw) => Some(MedicationStatus::from_str(raw).map_err(ApiError::from)?),
        None => None,
    };
    let filter = MedicationFilter {
        status,
        ..Default::default()
    };

    let conn = ctx.db()?;
    db::require_active_patient(&conn, &patient_id).map_err(ApiError::from)?;
    let medications = db::list_medications(&conn, &patient_id, &filter).map_err(ApiError::from)?;

    Ok(Json(Envelope::new(medications, &request_id)))
}
