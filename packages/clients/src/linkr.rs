//! Linkr API client types and HTTP client.

pub mod v1;
