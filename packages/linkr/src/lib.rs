//! Linkr: a multi-tenant URL shortener.
//!
//! Short identifiers redirect to destination URLs, optionally scoped to a
//! namespace and given a lifetime. Creating links and API clients requires a
//! signed request from a client whose role permits it; following a link is
//! public.

pub mod api;
pub mod auth;
pub mod crypto;
pub mod db;
pub mod error;
pub mod identity;
pub mod link;
pub mod namespace;
