//! Shared types for the portal API layer: request context, the
//! authenticated principal, and the response envelope.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::models::filters::Page;

// ═══════════════════════════════════════════════════════════
// API context — shared state for all portal routes
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes. The single SQLite connection sits
/// behind a mutex; request handlers hold it only for the duration of their
/// queries, and the dashboard runs its transaction under the same guard.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
}

impl ApiContext {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}

// ═══════════════════════════════════════════════════════════
// Principal — identity forwarded by the gateway
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalRole {
    Patient,
    Provider,
    Admin,
}

impl PrincipalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Provider => "provider",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for PrincipalRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Self::Patient),
            "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            _ => Err(()),
        }
    }
}

/// The authenticated caller, as asserted by the identity gateway. Injected
/// into request extensions by the principal middleware; handlers receive it
/// explicitly, never through ambient session state.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub role: PrincipalRole,
}

impl Principal {
    /// Resolve which patient a `/patients/me` operation targets.
    ///
    /// Patients act on themselves; a mismatched explicit id gets the same
    /// 404 an absent id would, so existence is never leaked. Staff must
    /// name a patient via the `patient_id` query parameter.
    pub fn resolve_patient(&self, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
        match self.role {
            PrincipalRole::Patient => match requested {
                None => Ok(self.id),
                Some(id) if id == self.id => Ok(self.id),
                Some(id) => Err(ApiError::NotFound(format!("Patient {id} not found"))),
            },
            PrincipalRole::Provider | PrincipalRole::Admin => requested.ok_or_else(|| {
                ApiError::BadRequest("patient_id query parameter required for staff access".into())
            }),
        }
    }

    /// Whether this principal may touch resources owned by `patient_id`.
    pub fn may_access(&self, patient_id: &Uuid) -> bool {
        match self.role {
            PrincipalRole::Patient => self.id == *patient_id,
            PrincipalRole::Provider | PrincipalRole::Admin => true,
        }
    }
}

/// Request correlation id, honoured from `X-Request-ID` or generated.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

// ═══════════════════════════════════════════════════════════
// Response envelope
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub timestamp: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageMeta>,
}

#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T, request_id: &RequestId) -> Self {
        Self {
            success: true,
            data,
            meta: Meta {
                timestamp: chrono::Utc::now().to_rfc3339(),
                request_id: request_id.0.clone(),
                pagination: None,
            },
        }
    }

    pub fn paginated(data: T, request_id: &RequestId, page: &Page, total: u32) -> Self {
        let mut envelope = Self::new(data, request_id);
        envelope.meta.pagination = Some(PageMeta {
            page: page.page,
            per_page: page.per_page,
            total,
        });
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn patient_principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            role: PrincipalRole::Patient,
        }
    }

    #[test]
    fn role_parses_known_values() {
        assert_eq!(PrincipalRole::from_str("patient").unwrap(), PrincipalRole::Patient);
        assert_eq!(PrincipalRole::from_str("provider").unwrap(), PrincipalRole::Provider);
        assert_eq!(PrincipalRole::from_str("admin").unwrap(), PrincipalRole::Admin);
        assert!(PrincipalRole::from_str("nurse").is_err());
    }

    #[test]
    fn patient_resolves_to_self_without_query() {
        let principal = patient_principal();
        assert_eq!(principal.resolve_patient(None).unwrap(), principal.id);
    }

    #[test]
    fn patient_resolves_to_self_with_own_id() {
        let principal = patient_principal();
        assert_eq!(
            principal.resolve_patient(Some(principal.id)).unwrap(),
            principal.id
        );
    }

    #[test]
    fn patient_requesting_other_patient_gets_not_found() {
        let principal = patient_principal();
        let result = principal.resolve_patient(Some(Uuid::new_v4()));
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn staff_must_name_a_patient() {
        let principal = Principal {
            id: Uuid::new_v4(),
            role: PrincipalRole::Provider,
        };
        assert!(matches!(
            principal.resolve_patient(None),
            Err(ApiError::BadRequest(_))
        ));

        let target = Uuid::new_v4();
        assert_eq!(principal.resolve_patient(Some(target)).unwrap(), target);
    }

    #[test]
    fn access_check_scopes_patients_to_themselves() {
        let principal = patient_principal();
        assert!(principal.may_access(&principal.id));
        assert!(!principal.may_access(&Uuid::new_v4()));

        let admin = Principal {
            id: Uuid::new_v4(),
            role: PrincipalRole::Admin,
        };
        assert!(admin.may_access(&Uuid::new_v4()));
    }

    #[test]
    fn envelope_serializes_without_pagination() {
        let envelope = Envelope::new(42, &RequestId("req-1".into()));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);
        assert_eq!(json["meta"]["request_id"], "req-1");
        assert!(json["meta"].get("pagination").is_none());
    }

    #[test]
    fn envelope_serializes_pagination() {
        let page = Page { page: 2, per_page: 20 };
        let envelope = Envelope::paginated(vec![1, 2, 3], &RequestId("req-2".into()), &page, 43);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["meta"]["pagination"]["page"], 2);
        assert_eq!(json["meta"]["pagination"]["per_page"], 20);
        assert_eq!(json["meta"]["pagination"]["total"], 43);
    }
}
