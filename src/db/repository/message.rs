use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::patient::patient_exists;
use crate::db::repository::provider::provider_exists;
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

use super::parse_datetime;

const MESSAGE_COLUMNS: &str = "id, patient_id, provider_id, thread_id, subject, body,
         sender_type, priority, is_read, read_at, created_at";

pub fn insert_message(conn: &Connection, message: &Message) -> Result<(), DatabaseError> {
    if !patient_exists(conn, &message.patient_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "message references missing patient {}",
            message.patient_id
        )));
    }
    if !provider_exists(conn, &message.provider_id)? {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "message references missing provider {}",
            message.provider_id
        )));
    }
    if message.is_read != message.read_at.is_some() {
        return Err(DatabaseError::ConstraintViolation(
            "read_at must be set exactly when is_read is true".into(),
        ));
    }

    conn.execute(
        "INSERT INTO messages (id, patient_id, provider_id, thread_id, subject, body,
         sender_type, priority, is_read, read_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            message.id.to_string(),
            message.patient_id.to_string(),
            message.provider_id.to_string(),
            message.thread_id.to_string(),
            message.subject,
            message.body,
            message.sender_type.as_str(),
            message.priority.as_str(),
            message.is_read as i32,
            message.read_at.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            message.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_message(conn: &Connection, id: &Uuid) -> Result<Option<Message>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], |row| Ok(message_row_from_rusqlite(row)));

    match result {
        Ok(row) => Ok(Some(message_from_row(row?)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Messages in insertion order; equal timestamps break by id so a thread
/// always reads the same way.
pub fn list_messages(
    conn: &Connection,
    patient_id: &Uuid,
    filter: &MessageFilter,
) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE patient_id = ?1
           AND (?2 IS NULL OR thread_id = ?2)
           AND (?3 = 0 OR is_read = 0)
         ORDER BY created_at ASC, id ASC"
    ))?;

    let rows = stmt.query_map(
        params![
            patient_id.to_string(),
            filter.thread_id.map(|id| id.to_string()),
            filter.unread_only as i32,
        ],
        |row| Ok(message_row_from_rusqlite(row)),
    )?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(message_from_row(row??)?);
    }
    Ok(messages)
}

/// Idempotent: marking an already-read message leaves `read_at` unchanged
/// and reports no error.
pub fn mark_message_read(
    conn: &Connection,
    id: &Uuid,
    now: NaiveDateTime,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE messages SET is_read = 1,
         read_at = COALESCE(read_at, ?2)
         WHERE id = ?1",
        params![id.to_string(), now.format("%Y-%m-%d %H:%M:%S").to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Message", id));
    }
    Ok(())
}

/// Unread count as the patient sees it: provider-authored messages only.
/// The patient's own unread outbound messages do not count.
pub fn count_unread_from_provider(conn: &Connection, patient_id: &Uuid) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM messages
         WHERE patient_id = ?1 AND sender_type = 'provider' AND is_read = 0",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

// Internal row type for Message mapping
struct MessageRow {
    id: String,
    patient_id: String,
    provider_id: String,
    thread_id: String,
    subject: String,
    body: String,
    sender_type: String,
    priority: String,
    is_read: i32,
    read_at: Option<String>,
    created_at: String,
}

fn message_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        provider_id: row.get(2)?,
        thread_id: row.get(3)?,
        subject: row.get(4)?,
        body: row.get(5)?,
        sender_type: row.get(6)?,
        priority: row.get(7)?,
        is_read: row.get(8)?,
        read_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn message_from_row(row: MessageRow) -> Result<Message, DatabaseError> {
    Ok(Message {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        patient_id: Uuid::parse_str(&row.patient_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        provider_id: Uuid::parse_str(&row.provider_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        thread_id: Uuid::parse_str(&row.thread_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        subject: row.subject,
        body: row.body,
        sender_type: SenderType::from_str(&row.sender_type)?,
        priority: MessagePriority::from_str(&row.priority)?,
        is_read: row.is_read != 0,
        read_at: row.read_at.as_deref().and_then(parse_datetime),
        created_at: parse_datetime(&row.created_at).unwrap_or_default(),
    })
}
