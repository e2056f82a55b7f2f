//! Appointment list endpoint with status/date-range filters.

use std::str::FromStr;

use axum::extract::{Query, State};
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::endpoints::scoped_patient;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, Principal, RequestId};
use crate::db;
use crate::models::enums::AppointmentStatus;
use crate::models::{Appointment, AppointmentFilter, Page};

#[derive(Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub patient_id: Option<String>,
}

/// `GET /api/v1/patients/me/appointments` — filtered, paginated list.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Envelope<Vec<Appointment>>>, ApiError> {
    let patient_id = scoped_patient(&principal, &query.patient_id)?;

    let status = match &query.status {
        Some(raw) => Some(AppointmentStatus::from_str(raw).map_err(ApiError::from)?),
        None => None,
    };
    let filter = AppointmentFilter {
        status,
        from: parse_date_bound(&query.from, "from", false)?,
        to: parse_date_bound(&query.to, "to", true)?,
    };
    let page = Page::clamped(query.page, query.per_page);

    let conn = ctx.db()?;
    db::require_active_patient(&conn, &patient_id).map_err(ApiError::from)?;
    let appointments =
        db::list_appointments(&conn, &patient_id, &filter, &page).map_err(ApiError::from)?;
    let total = db::count_appointments(&conn, &patient_id, &filter).map_err(ApiError::from)?;

    Ok(Json(Envelope::paginated(appointments, &request_id, &page, total)))
}

/// A `from` bound starts at midnight; a `to` bound runs to end of day.
fn parse_date_bound(
    raw: &Option<String>,
    field: &str,
    end_of_day: bool,
) -> Result<Option<chrono::NaiveDateTime>, ApiError> {
    let Some(raw) = raw else { return Ok(None) };
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| ApiError::BadRequest(format!("Invalid {field} date: {e}")))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    Ok(time)
}
