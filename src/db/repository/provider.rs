use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_provider(conn: &Connection, provider: &Provider) -> Result<(), DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM providers WHERE email = ?1",
        params![provider.email],
        |row| row.get(0),
    )?;
    if count > 0 {
        return Err(DatabaseError::UniqueViolation {
            field: "providers.email".into(),
            value: provider.email.clone(),
        });
    }

    conn.execute(
        "INSERT INTO providers (id, first_name, last_name, title, specialty, department, email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            provider.id.to_string(),
            provider.first_name,
            provider.last_name,
            provider.title,
            provider.specialty,
            provider.department,
            provider.email,
        ],
    )?;
    Ok(())
}

pub fn get_provider(conn: &Connection, id: &Uuid) -> Result<Option<Provider>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, title, specialty, department, email
         FROM providers WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], provider_from_row);

    match result {
        Ok(prov) => Ok(Some(prov)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_providers(conn: &Connection) -> Result<Vec<Provider>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, title, specialty, department, email
         FROM providers ORDER BY last_name, first_name",
    )?;

    let rows = stmt.query_map([], provider_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Restrict-delete: a provider referenced by any appointment, medication,
/// or message cannot be removed.
pub fn delete_provider(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let references = count_provider_references(conn, id)?;
    if references > 0 {
        return Err(DatabaseError::ForeignKeyViolation(format!(
            "provider {id} is referenced by {references} records"
        )));
    }

    let changed = conn.execute("DELETE FROM providers WHERE id = ?1", params![id.to_string()])?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Provider", id));
    }
    Ok(())
}

fn count_provider_references(conn: &Connection, id: &Uuid) -> Result<i64, DatabaseError> {
    let id = id.to_string();
    let count: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM appointments WHERE provider_id = ?1)
              + (SELECT COUNT(*) FROM medications WHERE prescriber_id = ?1)
              + (SELECT COUNT(*) FROM messages WHERE provider_id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(crate) fn provider_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM providers WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn provider_from_row(row: &rusqlite::Row<'_>) -> Result<Provider, rusqlite::Error> {
    Ok(Provider {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        title: row.get(3)?,
        specialty: row.get(4)?,
        department: row.get(5)?,
        email: row.get(6)?,
    })
}
