use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_record_number: String,
    pub preferred_language: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// Mutable contact fields for `PUT /patients/me`. Everything else on a
/// patient record is set by administrative onboarding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientContactUpdate {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub preferred_language: Option<String>,
}
