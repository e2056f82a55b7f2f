pub mod api; // Access Surface: axum router, middleware, server lifecycle
pub mod config;
pub mod dashboard; // Aggregation Layer: the patient dashboard snapshot
pub mod db; // Entity Store + Integrity Layer over SQLite
pub mod models;
