//! Principal-extraction middleware.
//!
//! The identity gateway terminates authentication and forwards the verified
//! principal in trusted headers. This middleware turns those headers into an
//! explicit `Principal` in request extensions; handlers take it as a
//! parameter. Requests without a usable principal never reach a handler.

use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{Principal, PrincipalRole};

pub const PRINCIPAL_ID_HEADER: &str = "X-Principal-Id";
pub const PRINCIPAL_ROLE_HEADER: &str = "X-Principal-Role";

/// Require a gateway-asserted principal on the request.
pub async fn require_principal(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match principal_from_headers(req.headers()) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, ApiError> {
    let id = headers
        .get(PRINCIPAL_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;
    let role = headers
        .get(PRINCIPAL_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let id = Uuid::parse_str(id).map_err(|_| ApiError::Unauthorized)?;
    let role: PrincipalRole = role.parse().map_err(|_| ApiError::Unauthorized)?;

    Ok(Principal { id, role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(id) = id {
            map.insert(PRINCIPAL_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            map.insert(PRINCIPAL_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        map
    }

    #[test]
    fn valid_headers_produce_principal() {
        let id = Uuid::new_v4();
        let map = headers(Some(&id.to_string()), Some("patient"));
        let principal = principal_from_headers(&map).unwrap();
        assert_eq!(principal.id, id);
        assert_eq!(principal.role, PrincipalRole::Patient);
    }

    #[test]
    fn missing_id_is_unauthorized() {
        let map = headers(None, Some("patient"));
        assert!(matches!(
            principal_from_headers(&map),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn missing_role_is_unauthorized() {
        let id = Uuid::new_v4();
        let map = headers(Some(&id.to_string()), None);
        assert!(matches!(
            principal_from_headers(&map),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn malformed_id_is_unauthorized() {
        let map = headers(Some("not-a-uuid"), Some("patient"));
        assert!(matches!(
            principal_from_headers(&map),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn unknown_role_is_unauthorized() {
        let id = Uuid::new_v4();
        let map = headers(Some(&id.to_string()), Some("superuser"));
        assert!(matches!(
            principal_from_headers(&map),
            Err(ApiError::Unauthorized)
        ));
    }
}
