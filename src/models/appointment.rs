use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub appointment_date: NaiveDateTime,
    pub duration_minutes: i32,
    pub appointment_type: Option<String>,
    pub status: AppointmentStatus,
    pub location: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}
