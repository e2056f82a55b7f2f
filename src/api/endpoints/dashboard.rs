//! Dashboard endpoint — the aggregated patient snapshot.

use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;

use crate::api::endpoints::patients::PatientScope;
use crate::api::endpoints::scoped_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, Principal, RequestId};
use crate::dashboard::{self, DashboardSnapshot};
use crate::db::DatabaseError;

/// `GET /api/v1/patients/me/dashboard` — single consistent snapshot.
///
/// An unknown patient is a 404; any other failure inside the snapshot fails
/// the whole request. The client retries; it never receives partial sections.
pub async fn snapshot(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(scope): Query<PatientScope>,
) -> Result<Json<Envelope<DashboardSnapshot>>, ApiError> {
    let patient_id = scoped_patient(&principal, &scope.patient_id)?;

    let mut conn = ctx.db()?;
    let snapshot = dashboard::assemble_dashboard(&mut conn, &patient_id, chrono::Utc::now().naive_utc())
        .map_err(|e| match e {
            DatabaseError::NotFound { .. } => ApiError::from(e),
            other => ApiError::Aggregation(other.to_string()),
        })?;

    Ok(Json(Envelope::new(snapshot, &request_id)))
}
