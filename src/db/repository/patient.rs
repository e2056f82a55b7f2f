use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    ensure_email_free(conn, &patient.email, None)?;
    ensure_mrn_free(conn, &patient.medical_record_number)?;

    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, date_of_birth, email, phone,
         address, medical_record_number, preferred_language, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.date_of_birth.to_string(),
            patient.email,
            patient.phone,
            patient.address,
            patient.medical_record_number,
            patient.preferred_language,
            patient.is_active as i32,
            patient.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            patient.updated_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, date_of_birth, email, phone, address,
         medical_record_number, preferred_language, is_active, created_at, updated_at
         FROM patients WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| Ok(patient_row_from_rusqlite(row)));

    match result {
        Ok(row) => Ok(Some(patient_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Patient lookup for portal operations: missing and deactivated patients
/// are indistinguishable to the caller.
pub fn require_active_patient(conn: &Connection, id: &Uuid) -> Result<Patient, DatabaseError> {
    match get_patient(conn, id)? {
        Some(p) if p.is_active => Ok(p),
        _ => Err(DatabaseError::not_found("Patient", id)),
    }
}

pub fn update_patient_contact(
    conn: &Connection,
    id: &Uuid,
    update: &PatientContactUpdate,
    now: NaiveDateTime,
) -> Result<Patient, DatabaseError> {
    let current = require_active_patient(conn, id)?;

    let email = update.email.clone().unwrap_or(current.email);
    ensure_email_free(conn, &email, Some(id))?;

    conn.execute(
        "UPDATE patients SET email = ?2, phone = ?3, address = ?4,
         preferred_language = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            id.to_string(),
            email,
            update.phone.clone().or(current.phone),
            update.address.clone().or(current.address),
            update
                .preferred_language
                .clone()
                .unwrap_or(current.preferred_language),
            now.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;

    require_active_patient(conn, id)
}

/// Soft-deactivate: the record and its dependents survive, but portal
/// operations treat the patient as absent.
pub fn deactivate_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET is_active = 0 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

/// Hard delete. Appointments, lab results, medications, messages, and
/// health alerts cascade via the schema.
pub fn delete_patient_cascade(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

pub(crate) fn patient_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn ensure_email_free(
    conn: &Connection,
    email: &str,
    exclude: Option<&Uuid>,
) -> Result<(), DatabaseError> {
    let count: i64 = match exclude {
        Some(id) => conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE email = ?1 AND id != ?2",
            params![email, id.to_string()],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM patients WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )?,
    };
    if count > 0 {
        return Err(DatabaseError::UniqueViolation {
            field: "patients.email".into(),
            value: email.into(),
        });
    }
    Ok(())
}

fn ensure_mrn_free(conn: &Connection, mrn: &str) -> Result<(), DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE medical_record_number = ?1",
        params![mrn],
        |row| row.get(0),
    )?;
    if count > 0 {
        return Err(DatabaseError::UniqueViolation {
            field: "patients.medical_record_number".into(),
            value: mrn.into(),
        });
    }
    Ok(())
}

// Internal row type for Patient mapping
struct PatientRow {
    id: String,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    medical_record_number: String,
    preferred_language: String,
    is_active: i32,
    created_at: String,
    updated_at: Option<String>,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        address: row.get(6)?,
        medical_record_number: row.get(7)?,
        preferred_language: row.get(8)?,
        is_active: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: NaiveDate::parse_from_str(&row.date_of_birth, "%Y-%m-%d")
            .unwrap_or_default(),
        email: row.email,
        phone: row.phone,
        address: row.address,
        medical_record_number: row.medical_record_number,
        preferred_language: row.preferred_language,
        is_active: row.is_active != 0,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_default(),
        updated_at: row
            .updated_at
            .and_then(|t| NaiveDateTime::parse_from_str(&t, "%Y-%m-%d %H:%M:%S").ok()),
    })
}
