//! Patient profile endpoints: fetch and contact-field update.

use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::api::endpoints::scoped_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, Principal, RequestId};
use crate::db;
use crate::models::{Patient, PatientContactUpdate};

#[derive(Deserialize)]
pub struct PatientScope {
    pub patient_id: Option<String>,
}

/// `GET /api/v1/patients/me` — current profile.
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(scope): Query<PatientScope>,
) -> Result<Json<Envelope<Patient>>, ApiError> {
    let patient_id = scoped_patient(&principal, &scope.patient_id)?;

    let conn = ctx.db()?;
    let patient = db::require_active_patient(&conn, &patient_id).map_err(ApiError::from)?;

    Ok(Json(Envelope::new(patient, &request_id)))
}

/// `PUT /api/v1/patients/me` — update mutable contact fields.
pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(scope): Query<PatientScope>,
    Json(update): Json<PatientContactUpdate>,
) -> Result<Json<Envelope<Patient>>, ApiError> {
    let patient_id = scoped_patient(&principal, &scope.patient_id)?;

    if let Some(email) = &update.email {
        if !email.contains('@') {
            return Err(ApiError::Validation(format!(
                "email is not a valid address: {email}"
            )));
        }
    }
    if matches!(&update.preferred_language, Some(lang) if lang.is_empty()) {
        return Err(ApiError::Validation("preferred_language must not be empty".into()));
    }

    let conn = ctx.db()?;
    let patient = db::update_patient_contact(&conn, &patient_id, &update, chrono::Utc::now().naive_utc())
        .map_err(ApiError::from)?;

    Ok(Json(Envelope::new(patient, &request_id)))
}
