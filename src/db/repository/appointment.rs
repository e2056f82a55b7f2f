use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::patient::patient_exists;
use crate::db::repository::provider::provider_exists;
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "id, patient_id, provider_id, appointment_date,
         duration_minutes, appointment_type, status, location, reason, notes";

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    if !patient_exists(conn, &appt.patient_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "appointment references missing patient {}",
            appt.patient_id
        )));
    }
    if !provider_exists(conn, &appt.provider_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "appointment references missing provider {}",
            appt.provider_id
        )));
    }

    conn.execute(
        "INSERT INTO appointments (id, patient_id, provider_id, appointment_date,
         duration_minutes, appointment_type, status, location, reason, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.provider_id.to_string(),
            appt.appointment_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            appt.duration_minutes,
            appt.appointment_type,
            appt.status.as_str(),
            appt.location,
            appt.reason,
            appt.notes,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], |row| Ok(appointment_row_from_rusqlite(row)));

    match result {
        Ok(row) => Ok(Some(appointment_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_appointments(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &AppointmentFilter,
    page: &Page,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE patient_id = ?1
           AND (?2 IS NULL OR status = ?2)
           AND (?3 IS NULL OR appointment_date >= ?3)
           AND (?4 IS NULL OR appointment_date <= ?4)
         ORDER BY appointment_date ASC, id ASC
         LIMIT ?5 OFFSET ?6"
    ))?;

    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            filter.status.as_ref().map(|s| s.as_str()),
            filter.from.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            filter.to.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            page.limit(),
            page.offset(),
        ],
        |row| Ok(appointment_row_from_rusqlite(row)),
    )?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row??)?);
    }
    Ok(appointments)
}

/// Total matching the filter, independent of the pagination window.
pub fn count_appointments(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &AppointmentFilter,
) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE patient_id = ?1
           AND (?2 IS NULL OR status = ?2)
           AND (?3 IS NULL OR appointment_date >= ?3)
           AND (?4 IS NULL OR appointment_date <= ?4)",
        params![
            patient_id.to_string(),
            filter.status.as_ref().map(|s| s.as_str()),
            filter.from.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            filter.to.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        ],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Status transitions only move forward through the lifecycle; terminal
/// states admit no further change.
pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    new_status: &AppointmentStatus,
) -> Result<(), DatabaseError> {
    let current = get_appointment(conn, id)?.ok_or_else(|| DatabaseError::not_found("Appointment", id))?;

    if current.status.is_terminal() || new_status.ordinal() <= current.status.ordinal() {
        return Err(DatabaseError::ConstraintViolation(format!(
            "invalid appointment transition {} -> {}",
            current.status.as_str(),
            new_status.as_str()
        )));
    }

    conn.execute(
        "UPDATE appointments SET status = ?2 WHERE id = ?1",
        params![id.to_string(), new_status.as_str()],
    )?;
    Ok(())
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: String,
    patient_id: String,
    provider_id: String,
    appointment_date: String,
    duration_minutes: i32,
    appointment_type: Option<String>,
    status: String,
    location: Option<String>,
    reason: Option<String>,
    notes: Option<String>,
}

fn appointment_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        provider_id: row.get(2)?,
        appointment_date: row.get(3)?,
        duration_minutes: row.get(4)?,
        appointment_type: row.get(5)?,
        status: row.get(6)?,
        location: row.get(7)?,
        reason: row.get(8)?,
        notes: row.get(9)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        provider_id: Uuid::parse_str(&row.provider_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        appointment_date: NaiveDateTime::parse_from_str(&row.appointment_date, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_default(),
        duration_minutes: row.duration_minutes,
        appointment_type: row.appointment_type,
        status: AppointmentStatus::from_str(&row.status)?,
        location: row.location,
        reason: row.reason,
        notes: row.notes,
    })
}
