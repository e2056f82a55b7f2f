//! Portal API — the Access Surface.
//!
//! Exposes the patient-portal read and write operations as HTTP endpoints
//! under `/api/v1`. Every protected route requires a gateway-asserted
//! principal; the router is composable and can be mounted on any axum
//! server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::portal_router;
pub use server::{start_portal_server, PortalServer};
pub use types::{ApiContext, Principal, PrincipalRole};
