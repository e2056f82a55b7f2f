use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{MessagePriority, SenderType};

/// A secure message between a patient and a provider. Threading is by
/// shared `thread_id`; replies carry the id of the thread they join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub provider_id: Uuid,
    pub thread_id: Uuid,
    pub subject: String,
    pub body: String,
    pub sender_type: SenderType,
    pub priority: MessagePriority,
    pub is_read: bool,
    pub read_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}
