//! Secure messaging endpoints: thread listing, outbound send, mark-read.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::endpoints::{parse_uuid, scoped_patient};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Envelope, Principal, PrincipalRole, RequestId};
use crate::db;
use crate::models::enums::{MessagePriority, SenderType};
use crate::models::{Message, MessageFilter};

#[derive(Deserialize)]
pub struct MessageListQuery {
    pub thread_id: Option<String>,
    pub patient_id: Option<String>,
}

/// `GET /api/v1/patients/me/messages` — in insertion order, optionally
/// narrowed to one thread.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<Envelope<Vec<Message>>>, ApiError> {
    let patient_id = scoped_patient(&principal, &query.patient_id)?;

    let filter = MessageFilter {
        thread_id: match &query.thread_id {
            Some(raw) => Some(parse_uuid(raw, "thread_id")?),
            None => None,
        },
        ..Default::default()
    };

    let conn = ctx.db()?;
    db::require_active_patient(&conn, &patient_id).map_err(ApiError::from)?;
    let messages = db::list_messages(&conn, &patient_id, &filter).map_err(ApiError::from)?;

    Ok(Json(Envelope::new(messages, &request_id)))
}

#[derive(Deserialize)]
pub struct CreateMessageRequest {
    pub provider_id: String,
    pub subject: String,
    pub body: String,
    /// Reply into an existing thread; a fresh thread is opened otherwise.
    pub thread_id: Option<String>,
    pub priority: Option<String>,
}

/// `POST /api/v1/patients/me/messages` — send an outbound message.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<MessageListQuery>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<Json<Envelope<Message>>, ApiError> {
    let patient_id = scoped_patient(&principal, &query.patient_id)?;

    if request.subject.trim().is_empty() {
        return Err(ApiError::Validation("subject must not be empty".into()));
    }
    if request.body.trim().is_empty() {
        return Err(ApiError::Validation("body must not be empty".into()));
    }

    let provider_id = parse_uuid(&request.provider_id, "provider_id")?;
    let thread_id = match &request.thread_id {
        Some(raw) => parse_uuid(raw, "thread_id")?,
        None => Uuid::new_v4(),
    };
    let priority = match &request.priority {
        Some(raw) => MessagePriority::from_str(raw).map_err(ApiError::from)?,
        None => MessagePriority::Normal,
    };
    let sender_type = match principal.role {
        PrincipalRole::Provider => SenderType::Provider,
        _ => SenderType::Patient,
    };

    let message = Message {
        id: Uuid::new_v4(),
        patient_id,
        provider_id,
        thread_id,
        subject: request.subject,
        body: request.body,
        sender_type,
        priority,
        is_read: false,
        read_at: None,
        created_at: chrono::Utc::now().naive_utc(),
    };

    let conn = ctx.db()?;
    db::require_active_patient(&conn, &patient_id).map_err(ApiError::from)?;
    db::insert_message(&conn, &message).map_err(ApiError::from)?;

    Ok(Json(Envelope::new(message, &request_id)))
}

#[derive(Deserialize)]
pub struct MarkReadRequest {
    pub is_read: bool,
}

/// `PATCH /api/v1/messages/:id` — flip the read flag. Idempotent; the read
/// timestamp is set once and never moves.
pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Extension(request_id): Extension<RequestId>,
    Path(message_id): Path<String>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<Envelope<Message>>, ApiError> {
    if !request.is_read {
        return Err(ApiError::Validation("messages can only be marked read".into()));
    }

    let message_id = parse_uuid(&message_id, "message id")?;

    let conn = ctx.db()?;
    let message = db::get_message(&conn, &message_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Message {message_id} not found")))?;

    // Same 404 whether the message is absent or owned by someone else
    if !principal.may_access(&message.patient_id) {
        return Err(ApiError::NotFound(format!("Message {message_id} not found")));
    }

    db::mark_message_read(&conn, &message_id, chrono::Utc::now().naive_utc())
        .map_err(ApiError::from)?;
    let updated = db::get_message(&conn, &message_id)
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("Message {message_id} not found")))?;

    Ok(Json(Envelope::new(updated, &request_id)))
}
