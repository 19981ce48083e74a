//! Shared client library for API types and HTTP clients.
//!
//! This library provides type definitions and HTTP client implementations
//! for the Linkr API. Types are always available, while HTTP client code
//! is gated behind the `client` feature.
//!
//! ## Use of `#[non_exhaustive]`
//!
//! We use `#[non_exhaustive]` on structs to prevent users manually
//! constructing the types while still allowing their fields to be `pub` for
//! reading. Users construct the types either by:
//! - Using constructors on the types
//! - Using builder methods
//! - Using deserialization
//!
//! Some of these types carry invariants (for example a role is always one of
//! the four supported roles), and it's easier to uphold them if every type in
//! the crate follows the same rule.

pub mod linkr;

/// The latest Linkr client version.
#[cfg(feature = "client")]
pub type Linkr = linkr::v1::Client;

/// Linkr v1 client.
#[cfg(feature = "client")]
pub type LinkrV1 = linkr::v1::Client;
