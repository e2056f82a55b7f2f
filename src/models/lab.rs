use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::LabResultStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub test_name: String,
    pub test_code: Option<String>,
    pub category: Option<String>,
    pub result_value: Option<f64>,
    pub result_text: Option<String>,
    pub result_unit: Option<String>,
    pub reference_range: Option<String>,
    pub status: LabResultStatus,
    pub collected_date: Option<NaiveDateTime>,
    pub resulted_date: Option<NaiveDateTime>,
    pub provider_notes: Option<String>,
}
