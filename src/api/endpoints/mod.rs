pub mod alerts;
pub mod appointments;
pub mod dashboard;
pub mod health;
pub mod labs;
pub mod medications;
pub mod messages;
pub mod patients;

use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::Principal;

pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|e| ApiError::BadRequest(format!("Invalid {field}: {e}")))
}

/// Resolve the patient a `/patients/me` route targets: the caller for
/// patient principals, the `patient_id` query parameter for staff.
pub(crate) fn scoped_patient(
    principal: &Principal,
    patient_id: &Option<String>,
) -> Result<Uuid, ApiError> {
    let requested = match patient_id {
        Some(raw) => Some(parse_uuid(raw, "patient_id")?),
        None => None,
    };
    principal.resolve_patient(requested)
}
