pub mod principal;
pub mod request_id;
