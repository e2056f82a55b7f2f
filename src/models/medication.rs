use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MedicationStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub prescriber_id: Uuid,
    pub name: String,
    pub generic_name: Option<String>,
    pub dosage: String,
    pub frequency: String,
    pub instructions: Option<String>,
    pub quantity: Option<i32>,
    pub refills_remaining: i32,
    pub prescribed_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: MedicationStatus,
}
