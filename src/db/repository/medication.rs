use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::patient::patient_exists;
use crate::db::repository::provider::provider_exists;
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const MEDICATION_COLUMNS: &str = "id, patient_id, prescriber_id, name, generic_name, dosage,
         frequency, instructions, quantity, refills_remaining, prescribed_date, start_date,
         end_date, status";

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    if !patient_exists(conn, &med.patient_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "medication references missing patient {}",
            med.patient_id
        )));
    }
    if !provider_exists(conn, &med.prescriber_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "medication references missing prescriber {}",
            med.prescriber_id
        )));
    }

    conn.execute(
        "INSERT INTO medications (id, patient_id, prescriber_id, name, generic_name, dosage,
         frequency, instructions, quantity, refills_remaining, prescribed_date, start_date,
         end_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            med.id.to_string(),
            med.patient_id.to_string(),
            med.prescriber_id.to_string(),
            med.name,
            med.generic_name,
            med.dosage,
            med.frequency,
            med.instructions,
            med.quantity,
            med.refills_remaining,
            med.prescribed_date.to_string(),
            med.start_date.map(|d| d.to_string()),
            med.end_date.map(|d| d.to_string()),
            med.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_medication(conn: &Connection, id: &Uuid) -> Result<Option<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], |row| Ok(medication_row_from_rusqlite(row)));

    match result {
        Ok(row) => Ok(Some(medication_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_medications(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &MedicationFilter,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICATION_COLUMNS} FROM medications
         WHERE patient_id = ?1
           AND (?2 IS NULL OR status = ?2)
           AND (?3 IS NULL OR prescriber_id = ?3)
         ORDER BY prescribed_date DESC, id ASC"
    ))?;

    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            filter.status.as_ref().map(|s| s.as_str()),
            filter.prescriber_id.map(|id| id.to_string()),
        ],
        |row| Ok(medication_row_from_rusqlite(row)),
    )?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row??)?);
    }
    Ok(meds)
}

/// Medications are never deleted; lifecycle changes go through here.
pub fn update_medication_status(
    conn: &Connection,
    id: &Uuid,
    status: &MedicationStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE medications SET status = ?2 WHERE id = ?1",
        params![id.to_string(), status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Medication", id));
    }
    Ok(())
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    patient_id: String,
    prescriber_id: String,
    name: String,
    generic_name: Option<String>,
    dosage: String,
    frequency: String,
    instructions: Option<String>,
    quantity: Option<i32>,
    refills_remaining: i32,
    prescribed_date: String,
    start_date: Option<String>,
    end_date: Option<String>,
    status: String,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        prescriber_id: row.get(2)?,
        name: row.get(3)?,
        generic_name: row.get(4)?,
        dosage: row.get(5)?,
        frequency: row.get(6)?,
        instructions: row.get(7)?,
        quantity: row.get(8)?,
        refills_remaining: row.get(9)?,
        prescribed_date: row.get(10)?,
        start_date: row.get(11)?,
        end_date: row.get(12)?,
        status: row.get(13)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    Ok(Medication {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        prescriber_id: Uuid::parse_str(&row.prescriber_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        name: row.name,
        generic_name: row.generic_name,
        dosage: row.dosage,
        frequency: row.frequency,
        instructions: row.instructions,
        quantity: row.quantity,
        refills_remaining: row.refills_remaining,
        prescribed_date: NaiveDate::parse_from_str(&row.prescribed_date, "%Y-%m-%d")
            .unwrap_or_default(),
        start_date: row.start_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        end_date: row.end_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        status: MedicationStatus::from_str(&row.status)?,
    })
}
