//! Dashboard aggregation — types and query functions.
//!
//! Composes the five patient-dashboard sub-aggregations (upcoming
//! appointments, recent labs, active medications, unread messages, health
//! alerts) into one snapshot. All five are read inside a single SQLite
//! transaction, so the counts and the listed items always agree with each
//! other; any sub-query failure fails the whole snapshot.

use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, DatabaseError};

/// Display cap for the appointment/lab/medication lists. The count fields
/// always reflect the true totals.
const DISPLAY_LIMIT: u32 = 3;

/// How far back `recent_lab_results` looks, in days.
const LAB_WINDOW_DAYS: i64 = 90;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub upcoming_appointments: UpcomingAppointments,
    pub recent_lab_results: Vec<LabResultCard>,
    pub active_medications: ActiveMedications,
    pub unread_messages: u32,
    pub health_alerts: Vec<AlertCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpcomingAppointments {
    pub count: u32,
    pub items: Vec<AppointmentCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveMedications {
    pub count: u32,
    pub items: Vec<MedicationCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentCard {
    pub id: String,
    pub provider_name: String,
    pub appointment_date: String,
    pub duration_minutes: i32,
    pub appointment_type: Option<String>,
    pub location: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResultCard {
    pub id: String,
    pub test_name: String,
    pub value: String,
    pub reference_range: Option<String>,
    /// Raw status string; the client renders severity from it.
    pub status: String,
    pub resulted_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationCard {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub prescriber_name: String,
    pub prescribed_date: String,
    pub refills_remaining: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertCard {
    pub id: String,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub action_required: bool,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Build the dashboard snapshot for an active patient as of `now`.
///
/// Fails with NotFound for an unknown or deactivated patient. Runs inside
/// one transaction, so no interleaved write can make the five sections
/// disagree, and returns nothing partial: the first failing sub-query
/// aborts the snapshot.
pub fn assemble_dashboard(
    conn: &mut Connection,
    patient_id: &Uuid,
    now: NaiveDateTime,
) -> Result<DashboardSnapshot, DatabaseError> {
    let tx = conn.transaction()?;

    db::require_active_patient(&tx, patient_id)?;

    let upcoming_appointments = fetch_upcoming_appointments(&tx, patient_id, now)?;
    let recent_lab_results = fetch_recent_lab_results(&tx, patient_id, now)?;
    let active_medications = fetch_active_medications(&tx, patient_id)?;
    let unread_messages = db::count_unread_from_provider(&tx, patient_id)?;
    let health_alerts = fetch_health_alerts(&tx, patient_id, now)?;

    tx.commit()?;

    Ok(DashboardSnapshot {
        upcoming_appointments,
        recent_lab_results,
        active_medications,
        unread_messages,
        health_alerts,
    })
}

/// Future appointments still in `scheduled`, soonest first. The count is
/// the true total; the list stops at the display cap.
fn fetch_upcoming_appointments(
    conn: &Connection,
    patient_id: &Uuid,
    now: NaiveDateTime,
) -> Result<UpcomingAppointments, DatabaseError> {
    let now_str = now.format("%Y-%m-%d %H:%M:%S").to_string();

    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE patient_id = ?1 AND status = 'scheduled' AND appointment_date > ?2",
        params![patient_id.to_string(), now_str],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT a.id, a.appointment_date, a.duration_minutes, a.appointment_type,
                a.location, a.status,
                p.title, p.first_name, p.last_name
         FROM appointments a
         JOIN providers p ON a.provider_id = p.id
         WHERE a.patient_id = ?1 AND a.status = 'scheduled' AND a.appointment_date > ?2
         ORDER BY a.appointment_date ASC, a.id ASC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string(), now_str, DISPLAY_LIMIT], |row| {
        let title: Option<String> = row.get(6)?;
        let first: String = row.get(7)?;
        let last: String = row.get(8)?;
        Ok(AppointmentCard {
            id: row.get(0)?,
            provider_name: provider_display_name(title, &first, &last),
            appointment_date: row.get(1)?,
            duration_minutes: row.get(2)?,
            appointment_type: row.get(3)?,
            location: row.get(4)?,
            status: row.get(5)?,
        })
    })?;

    let items = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(UpcomingAppointments { count, items })
}

/// Lab results resulted within the last 90 days, newest first, capped for
/// display. Each carries its raw status for client-side severity rendering.
fn fetch_recent_lab_results(
    conn: &Connection,
    patient_id: &Uuid,
    now: NaiveDateTime,
) -> Result<Vec<LabResultCard>, DatabaseError> {
    let window_start = (now - Duration::days(LAB_WINDOW_DAYS))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();

    let mut stmt = conn.prepare(
        "SELECT id, test_name, result_value, result_text, result_unit,
                reference_range, status, resulted_date
         FROM lab_results
         WHERE patient_id = ?1 AND resulted_date IS NOT NULL AND resulted_date >= ?2
         ORDER BY resulted_date DESC, id ASC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(
        params![patient_id.to_string(), window_start, DISPLAY_LIMIT],
        |row| {
            let value: Option<f64> = row.get(2)?;
            let text: Option<String> = row.get(3)?;
            let unit: Option<String> = row.get(4)?;
            Ok(LabResultCard {
                id: row.get(0)?,
                test_name: row.get(1)?,
                value: format_result_value(value, text, unit),
                reference_range: row.get(5)?,
                status: row.get(6)?,
                resulted_date: row.get(7)?,
            })
        },
    )?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Active medication count plus the most recently prescribed for display.
fn fetch_active_medications(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<ActiveMedications, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM medications WHERE patient_id = ?1 AND status = 'active'",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT m.id, m.name, m.dosage, m.frequency, m.prescribed_date, m.refills_remaining,
                p.title, p.first_name, p.last_name
         FROM medications m
         JOIN providers p ON m.prescriber_id = p.id
         WHERE m.patient_id = ?1 AND m.status = 'active'
         ORDER BY m.prescribed_date DESC, m.id ASC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string(), DISPLAY_LIMIT], |row| {
        let title: Option<String> = row.get(6)?;
        let first: String = row.get(7)?;
        let last: String = row.get(8)?;
        Ok(MedicationCard {
            id: row.get(0)?,
            name: row.get(1)?,
            dosage: row.get(2)?,
            frequency: row.get(3)?,
            prescribed_date: row.get(4)?,
            refills_remaining: row.get(5)?,
            prescriber_name: provider_display_name(title, &first, &last),
        })
    })?;

    let items = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(ActiveMedications { count, items })
}

/// All unread, unexpired alerts. No truncation; the dashboard shows every
/// one of them.
fn fetch_health_alerts(
    conn: &Connection,
    patient_id: &Uuid,
    now: NaiveDateTime,
) -> Result<Vec<AlertCard>, DatabaseError> {
    let alerts = db::list_unread_alerts(conn, patient_id, now)?;
    Ok(alerts
        .into_iter()
        .map(|a| AlertCard {
            id: a.id.to_string(),
            alert_type: a.alert_type,
            severity: a.severity.as_str().to_string(),
            title: a.title,
            message: a.message,
            action_required: a.action_required,
            created_at: a.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect())
}

fn provider_display_name(title: Option<String>, first: &str, last: &str) -> String {
    match title {
        Some(t) => format!("{t} {first} {last}"),
        None => format!("{first} {last}"),
    }
}

/// "6.9 %" for numeric results, the text value otherwise.
fn format_result_value(value: Option<f64>, text: Option<String>, unit: Option<String>) -> String {
    match (value, text) {
        (Some(v), _) => match unit {
            Some(u) => format!("{v} {u}"),
            None => v.to_string(),
        },
        (None, Some(t)) => t,
        (None, None) => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::*;
    use crate::models::enums::*;
    use crate::models::*;
    use chrono::NaiveDate;

    const NOW: &str = "2026-06-15 12:00:00";

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn setup() -> (Connection, Uuid, Uuid) {
        let conn = open_memory_database().unwrap();
        let patient_id = Uuid::new_v4();
        insert_patient(&conn, &Patient {
            id: patient_id,
            first_name: "John".into(),
            last_name: "Doe".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1984, 6, 2).unwrap(),
            email: "john.doe@example.com".into(),
            phone: None,
            address: None,
            medical_record_number: "MRN-1001".into(),
            preferred_language: "en".into(),
            is_active: true,
            created_at: dt("2026-01-05 09:00:00"),
            updated_at: None,
        }).unwrap();

        let provider_id = Uuid::new_v4();
        insert_provider(&conn, &Provider {
            id: provider_id,
            first_name: "Amara".into(),
            last_name: "Chen".into(),
            title: Some("Dr.".into()),
            specialty: Some("Internal Medicine".into()),
            department: None,
            email: "a.chen@clinic.example".into(),
        }).unwrap();

        (conn, patient_id, provider_id)
    }

    fn add_appointment(conn: &Connection, patient: Uuid, provider: Uuid, when: &str, status: AppointmentStatus) -> Uuid {
        let id = Uuid::new_v4();
        insert_appointment(conn, &Appointment {
            id,
            patient_id: patient,
            provider_id: provider,
            appointment_date: dt(when),
            duration_minutes: 30,
            appointment_type: Some("routine".into()),
            status,
            location: None,
            reason: None,
            notes: None,
        }).unwrap();
        id
    }

    fn add_medication(conn: &Connection, patient: Uuid, provider: Uuid, name: &str, prescribed: &str, status: MedicationStatus) {
        insert_medication(conn, &Medication {
            id: Uuid::new_v4(),
            patient_id: patient,
            prescriber_id: provider,
            name: name.into(),
            generic_name: None,
            dosage: "500mg".into(),
            frequency: "daily".into(),
            instructions: None,
            quantity: None,
            refills_remaining: 1,
            prescribed_date: NaiveDate::parse_from_str(prescribed, "%Y-%m-%d").unwrap(),
            start_date: None,
            end_date: None,
            status,
        }).unwrap();
    }

    fn add_message(conn: &Connection, patient: Uuid, provider: Uuid, sender: SenderType, is_read: bool) {
        insert_message(conn, &Message {
            id: Uuid::new_v4(),
            patient_id: patient,
            provider_id: provider,
            thread_id: Uuid::new_v4(),
            subject: "s".into(),
            body: "b".into(),
            sender_type: sender,
            priority: MessagePriority::Normal,
            is_read,
            read_at: if is_read { Some(dt("2026-06-01 10:00:00")) } else { None },
            created_at: dt("2026-06-01 09:00:00"),
        }).unwrap();
    }

    fn add_lab(conn: &Connection, patient: Uuid, name: &str, resulted: &str, status: LabResultStatus) {
        insert_lab_result(conn, &LabResult {
            id: Uuid::new_v4(),
            patient_id: patient,
            test_name: name.into(),
            test_code: None,
            category: Some("Chemistry".into()),
            result_value: Some(5.1),
            result_text: None,
            result_unit: Some("mmol/L".into()),
            reference_range: Some("3.5-5.0".into()),
            status,
            collected_date: None,
            resulted_date: Some(dt(resulted)),
            provider_notes: None,
        }).unwrap();
    }

    #[test]
    fn empty_dashboard_for_new_patient() {
        let (mut conn, patient, _) = setup();
        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.upcoming_appointments.count, 0);
        assert!(snapshot.upcoming_appointments.items.is_empty());
        assert!(snapshot.recent_lab_results.is_empty());
        assert_eq!(snapshot.active_medications.count, 0);
        assert_eq!(snapshot.unread_messages, 0);
        assert!(snapshot.health_alerts.is_empty());
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let (mut conn, _, _) = setup();
        let result = assemble_dashboard(&mut conn, &Uuid::new_v4(), dt(NOW));
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn deactivated_patient_is_not_found() {
        let (mut conn, patient, _) = setup();
        deactivate_patient(&conn, &patient).unwrap();
        let result = assemble_dashboard(&mut conn, &patient, dt(NOW));
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn two_future_scheduled_one_past_completed() {
        let (mut conn, patient, provider) = setup();
        // D1 < D2, both future and scheduled
        add_appointment(&conn, patient, provider, "2026-07-01 09:00:00", AppointmentStatus::Scheduled);
        add_appointment(&conn, patient, provider, "2026-08-01 09:00:00", AppointmentStatus::Scheduled);
        // Past and completed, must not appear
        add_appointment(&conn, patient, provider, "2026-03-01 09:00:00", AppointmentStatus::Completed);

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        let upcoming = &snapshot.upcoming_appointments;
        assert_eq!(upcoming.count, 2);
        assert_eq!(upcoming.items.len(), 2);
        assert_eq!(upcoming.items[0].appointment_date, "2026-07-01 09:00:00");
        assert_eq!(upcoming.items[1].appointment_date, "2026-08-01 09:00:00");
        assert_eq!(upcoming.items[0].provider_name, "Dr. Amara Chen");
    }

    #[test]
    fn future_confirmed_appointment_not_counted_as_upcoming() {
        let (mut conn, patient, provider) = setup();
        add_appointment(&conn, patient, provider, "2026-07-01 09:00:00", AppointmentStatus::Confirmed);

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.upcoming_appointments.count, 0);
    }

    #[test]
    fn upcoming_count_exceeds_display_cap() {
        let (mut conn, patient, provider) = setup();
        for month in 7..=11 {
            add_appointment(
                &conn,
                patient,
                provider,
                &format!("2026-{month:02}-01 09:00:00"),
                AppointmentStatus::Scheduled,
            );
        }

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.upcoming_appointments.count, 5);
        assert_eq!(snapshot.upcoming_appointments.items.len(), 3);
        // Soonest three, ascending
        assert_eq!(snapshot.upcoming_appointments.items[0].appointment_date, "2026-07-01 09:00:00");
        assert_eq!(snapshot.upcoming_appointments.items[2].appointment_date, "2026-09-01 09:00:00");
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let (mut conn, patient, provider) = setup();
        let mut ids: Vec<String> = (0..4)
            .map(|_| {
                add_appointment(&conn, patient, provider, "2026-07-01 09:00:00", AppointmentStatus::Scheduled)
                    .to_string()
            })
            .collect();
        ids.sort();

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        let shown: Vec<String> = snapshot
            .upcoming_appointments
            .items
            .iter()
            .map(|a| a.id.clone())
            .collect();
        assert_eq!(shown, ids[..3].to_vec());
    }

    #[test]
    fn active_medication_count_excludes_discontinued() {
        let (mut conn, patient, provider) = setup();
        add_medication(&conn, patient, provider, "Metformin", "2026-01-10", MedicationStatus::Active);
        add_medication(&conn, patient, provider, "Omeprazole", "2026-02-15", MedicationStatus::Active);
        add_medication(&conn, patient, provider, "Atorvastatin", "2025-11-02", MedicationStatus::Discontinued);

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.active_medications.count, 2);
        assert_eq!(snapshot.active_medications.items.len(), 2);
        // Most recently prescribed first
        assert_eq!(snapshot.active_medications.items[0].name, "Omeprazole");
        assert_eq!(snapshot.active_medications.items[1].name, "Metformin");
    }

    #[test]
    fn unread_messages_counts_provider_authored_only() {
        let (mut conn, patient, provider) = setup();
        add_message(&conn, patient, provider, SenderType::Provider, false);
        add_message(&conn, patient, provider, SenderType::Provider, false);
        add_message(&conn, patient, provider, SenderType::Provider, true);
        // Patient-authored unread is excluded from the patient's own count
        add_message(&conn, patient, provider, SenderType::Patient, false);

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.unread_messages, 2);
    }

    #[test]
    fn recent_labs_respect_window_and_cap() {
        let (mut conn, patient, _) = setup();
        add_lab(&conn, patient, "HbA1c", "2026-06-01 13:00:00", LabResultStatus::Abnormal);
        add_lab(&conn, patient, "Potassium", "2026-05-20 13:00:00", LabResultStatus::Critical);
        add_lab(&conn, patient, "Glucose", "2026-04-10 13:00:00", LabResultStatus::Normal);
        add_lab(&conn, patient, "Sodium", "2026-03-25 13:00:00", LabResultStatus::Normal);
        // Outside the 90-day window
        add_lab(&conn, patient, "TSH", "2026-01-02 13:00:00", LabResultStatus::Normal);

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.recent_lab_results.len(), 3);
        assert_eq!(snapshot.recent_lab_results[0].test_name, "HbA1c");
        assert_eq!(snapshot.recent_lab_results[0].status, "abnormal");
        assert_eq!(snapshot.recent_lab_results[0].value, "5.1 mmol/L");
        assert_eq!(snapshot.recent_lab_results[2].test_name, "Glucose");
    }

    #[test]
    fn health_alerts_not_truncated() {
        let (mut conn, patient, _) = setup();
        for i in 0..7 {
            insert_health_alert(&conn, &HealthAlert {
                id: Uuid::new_v4(),
                patient_id: patient,
                alert_type: "medication".into(),
                severity: AlertSeverity::Warning,
                title: format!("Alert {i}"),
                message: "".into(),
                action_required: false,
                is_read: false,
                read_at: None,
                expires_at: None,
                created_at: dt("2026-06-01 08:00:00"),
            }).unwrap();
        }

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.health_alerts.len(), 7);
        assert_eq!(snapshot.health_alerts[0].severity, "warning");
    }

    #[test]
    fn expired_alerts_are_excluded() {
        let (mut conn, patient, _) = setup();
        insert_health_alert(&conn, &HealthAlert {
            id: Uuid::new_v4(),
            patient_id: patient,
            alert_type: "appointment".into(),
            severity: AlertSeverity::Info,
            title: "Old reminder".into(),
            message: "".into(),
            action_required: false,
            is_read: false,
            read_at: None,
            expires_at: Some(dt("2026-06-01 00:00:00")),
            created_at: dt("2026-05-01 08:00:00"),
        }).unwrap();

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert!(snapshot.health_alerts.is_empty());
    }

    #[test]
    fn snapshot_ignores_other_patients_data() {
        let (mut conn, patient, provider) = setup();
        let other = Uuid::new_v4();
        insert_patient(&conn, &Patient {
            id: other,
            first_name: "Jane".into(),
            last_name: "Roe".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            email: "jane.roe@example.com".into(),
            phone: None,
            address: None,
            medical_record_number: "MRN-2002".into(),
            preferred_language: "en".into(),
            is_active: true,
            created_at: dt("2026-01-05 09:00:00"),
            updated_at: None,
        }).unwrap();

        add_appointment(&conn, other, provider, "2026-07-01 09:00:00", AppointmentStatus::Scheduled);
        add_medication(&conn, other, provider, "Metformin", "2026-01-10", MedicationStatus::Active);
        add_message(&conn, other, provider, SenderType::Provider, false);

        let snapshot = assemble_dashboard(&mut conn, &patient, dt(NOW)).unwrap();
        assert_eq!(snapshot.upcoming_appointments.count, 0);
        assert_eq!(snapshot.active_medications.count, 0);
        assert_eq!(snapshot.unread_messages, 0);
    }
}
