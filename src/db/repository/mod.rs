//! Repository layer — entity-scoped database operations.
//!
//! Integrity rules (referenced-entity existence, uniqueness, enum
//! membership) are re-checked here in application code so violations
//! surface as typed `DatabaseError` values, not raw SQLite errors.

mod appointment;
mod health_alert;
mod lab_result;
mod medication;
mod message;
mod patient;
mod provider;

use chrono::NaiveDateTime;

// Re-export all public items from sub-modules
pub use appointment::*;
pub use health_alert::*;
pub use lab_result::*;
pub use medication::*;
pub use message::*;
pub use patient::*;
pub use provider::*;

pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
}
