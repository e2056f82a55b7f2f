//! Lab result list endpoint.

use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::scoped_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, Principal, RequestId};
use crate::db;
use crate::models::{LabResult, LabResultFilter, Page};

#[derive(Deserialize)]
pub struct LabListQuery {
    pub category: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub patient_id: Option<String>,
}

/// `GET /api/v1/patients/me/lab-results` — newest first, by category.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<LabListQuery>,
) -> Result<Json<Envelope<Vec<LabResult>>>, ApiError> {
    let patient_id = scoped_patient(&principal, &query.patient_id)?;

    let filter = LabResultFilter {
        category: query.category.clone(),
        ..Default::default()
    };
    let page = Page::clamped(query.page, query.per_page);

    let conn = ctx.db()?;
    db::require_active_patient(&conn, &patient_id).map_err(ApiError::from)?;
    let results = db::list_lab_results(&conn, &patient_id, &filter, &page).map_err(ApiError::from)?;
    let total = db::count_lab_results(&conn, &patient_id, &filter).map_err(ApiError::from)?;

    Ok(Json(Envelope::paginated(results, &request_id, &page, total)))
}
