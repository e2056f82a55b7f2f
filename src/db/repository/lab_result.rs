use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::patient::patient_exists;
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

use super::parse_datetime;

const LAB_COLUMNS: &str = "id, patient_id, test_name, test_code, category, result_value,
         result_text, result_unit, reference_range, status, collected_date, resulted_date,
         provider_notes";

pub fn insert_lab_result(conn: &Connection, lab: &LabResult) -> Result<(), DatabaseError> {
    if !patient_exists(conn, &lab.patient_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "lab result references missing patient {}",
            lab.patient_id
        )));
    }

    conn.execute(
        "INSERT INTO lab_results (id, patient_id, test_name, test_code, category,
         result_value, result_text, result_unit, reference_range, status,
         collected_date, resulted_date, provider_notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            lab.id.to_string(),
            lab.patient_id.to_string(),
            lab.test_name,
            lab.test_code,
            lab.category,
            lab.result_value,
            lab.result_text,
            lab.result_unit,
            lab.reference_range,
            lab.status.as_str(),
            lab.collected_date.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            lab.resulted_date.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            lab.provider_notes,
        ],
    )?;
    Ok(())
}

pub fn get_lab_result(conn: &Connection, id: &Uuid) -> Result<Option<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LAB_COLUMNS} FROM lab_results WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], |row| Ok(lab_row_from_rusqlite(row)));

    match result {
        Ok(row) => Ok(Some(lab_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_lab_results(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &LabResultFilter,
    page: &Page,
) -> Result<Vec<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LAB_COLUMNS} FROM lab_results
         WHERE patient_id = ?1
           AND (?2 IS NULL OR category = ?2)
           AND (?3 IS NULL OR status = ?3)
         ORDER BY resulted_date DESC, id ASC
         LIMIT ?4 OFFSET ?5"
    ))?;

    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            filter.category,
            filter.status.as_ref().map(|s| s.as_str()),
            page.limit(),
            page.offset(),
        ],
        |row| Ok(lab_row_from_rusqlite(row)),
    )?;

    let mut labs = Vec::new();
    for row in rows {
        labs.push(lab_from_row(row??)?);
    }
    Ok(labs)
}

pub fn count_lab_results(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &LabResultFilter,
) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM lab_results
         WHERE patient_id = ?1
           AND (?2 IS NULL OR category = ?2)
           AND (?3 IS NULL OR status = ?3)",
        params![
            patient_id.to_string(),
            filter.category,
            filter.status.as_ref().map(|s| s.as_str()),
        ],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// The single permitted mutation on a resulted lab: provider annotation.
pub fn update_provider_notes(
    conn: &Connection,
    id: &Uuid,
    notes: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE lab_results SET provider_notes = ?2 WHERE id = ?1",
        params![id.to_string(), notes],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("LabResult", id));
    }
    Ok(())
}

// Internal row type for LabResult mapping
struct LabRow {
    id: String,
    patient_id: String,
    test_name: String,
    test_code: Option<String>,
    category: Option<String>,
    result_value: Option<f64>,
    result_text: Option<String>,
    result_unit: Option<String>,
    reference_range: Option<String>,
    status: String,
    collected_date: Option<String>,
    resulted_date: Option<String>,
    provider_notes: Option<String>,
}

fn lab_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<LabRow, rusqlite::Error> {
    Ok(LabRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        test_name: row.get(2)?,
        test_code: row.get(3)?,
        category: row.get(4)?,
        result_value: row.get(5)?,
        result_text: row.get(6)?,
        result_unit: row.get(7)?,
        reference_range: row.get(8)?,
        status: row.get(9)?,
        collected_date: row.get(10)?,
        resulted_date: row.get(11)?,
        provider_notes: row.get(12)?,
    })
}

fn lab_from_row(row: LabRow) -> Result<LabResult, DatabaseError> {
    Ok(LabResult {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        test_name: row.test_name,
        test_code: row.test_code,
        category: row.category,
        result_value: row.result_value,
        result_text: row.result_text,
        result_unit: row.result_unit,
        reference_range: row.reference_range,
        status: LabResultStatus::from_str(&row.status)?,
        collected_date: row.collected_date.as_deref().and_then(parse_datetime),
        resulted_date: row.resulted_date.as_deref().and_then(parse_datetime),
        provider_notes: row.provider_notes,
    })
}
