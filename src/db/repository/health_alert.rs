use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::patient::patient_exists;
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

use super::parse_datetime;

const ALERT_COLUMNS: &str = "id, patient_id, alert_type, severity, title, message,
         action_required, is_read, read_at, expires_at, created_at";

pub fn insert_health_alert(conn: &Connection, alert: &HealthAlert) -> Result<(), DatabaseError> {
    if !patient_exists(conn, &alert.patient_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "health alert references missing patient {}",
            alert.patient_id
        )));
    }
    if alert.is_read != alert.read_at.is_some() {
        return Err(DatabaseError::ConstraintViolation(
            "read_at must be set exactly when is_read is true".into(),
        ));
    }

    conn.execute(
        "INSERT INTO health_alerts (id, patient_id, alert_type, severity, title, message,
         action_required, is_read, read_at, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            alert.id.to_string(),
            alert.patient_id.to_string(),
            alert.alert_type,
            alert.severity.as_str(),
            alert.title,
            alert.message,
            alert.action_required as i32,
            alert.is_read as i32,
            alert.read_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            alert.expires_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            alert.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_health_alert(conn: &Connection, id: &Uuid) -> Result<Option<HealthAlert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM health_alerts WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], |row| Ok(alert_row_from_rusqlite(row)));

    match result {
        Ok(row) => Ok(Some(alert_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Unread alerts that have not expired as of `now`, newest first.
pub fn list_unread_alerts(
    conn: &Connection,
    patient_id: &Uuid,
    now: NaiveDateTime,
) -> Result<Vec<HealthAlert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM health_alerts
         WHERE patient_id = ?1 AND is_read = 0
           AND (expires_at IS NULL OR expires_at > ?2)
         ORDER BY created_at DESC, id ASC"
    ))?;

    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            now.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
        |row| Ok(alert_row_from_rusqlite(row)),
    )?;

    let mut alerts = Vec::new();
    for row in rows {
        alerts.push(alert_from_row(row??)?);
    }
    Ok(alerts)
}

/// Idempotent, same contract as message mark-read.
pub fn mark_alert_read(conn: &Connection, id: &Uuid, now: NaiveDateTime) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE health_alerts SET is_read = 1,
         read_at = COALESCE(read_at, ?2)
         WHERE id = ?1",
        params![id.to_string(), now.format("%Y-%m-%d %H:%M:%S").to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("HealthAlert", id));
    }
    Ok(())
}

// Internal row type for HealthAlert mapping
struct AlertRow {
    id: String,
    patient_id: String,
    alert_type: String,
    severity: String,
    title: String,
    message: String,
    action_required: i32,
    is_read: i32,
    read_at: Option<String>,
    expires_at: Option<String>,
    created_at: String,
}

fn alert_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<AlertRow, rusqlite::Error> {
    Ok(AlertRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        alert_type: row.get(2)?,
        severity: row.get(3)?,
        title: row.get(4)?,
        message: row.get(5)?,
        action_required: row.get(6)?,
        is_read: row.get(7)?,
        read_at: row.get(8)?,
        expires_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn alert_from_row(row: AlertRow) -> Result<HealthAlert, DatabaseError> {
    Ok(HealthAlert {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        alert_type: row.alert_type,
        severity: AlertSeverity::from_str(&row.severity)?,
        title: row.title,
        message: row.message,
        action_required: row.action_required != 0,
        is_read: row.is_read != 0,
        read_at: row.read_at.as_deref().and_then(parse_datetime),
        expires_at: row.expires_at.as_deref().and_then(parse_datetime),
        created_at: parse_datetime(&row.created_at).unwrap_or_default(),
    })
}
