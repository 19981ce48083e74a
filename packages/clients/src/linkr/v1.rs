//! Linkr v1 API types and client.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use time::OffsetDateTime;

pub mod digest;

#[cfg(feature = "client")]
mod client;

#[cfg(feature = "client")]
pub use client::Client;

pub use digest::{Credentials, DigestClaims, Signature};

/// Header carrying the standard-base64 encoded client ID.
pub const API_KEY_HEADER: &str = "Linkr-Api-Key";

/// Header carrying the base64url encoded request digest.
pub const DIGEST_HEADER: &str = "Linkr-Digest";

/// Prefix marking request headers that are stored with a link.
///
/// For example a request header `Linkr-Forward-Super-Secret: 2313` is stored
/// as `super-secret=2313`.
pub const FORWARD_HEADER_PREFIX: &str = "Linkr-Forward-";

/// Tag of the system managed default namespace.
///
/// Callers can never address this namespace by name.
pub const RESERVED_NAMESPACE: &str = "-";

/// The access tier of an API client.
///
/// Roles are a closed set; the wire form is the hyphenated lowercase name and
/// parsing is case-sensitive. There is no ordering between roles: endpoints
/// list every role they allow.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Debug,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// May create links and clients.
    Admin,

    /// May create links.
    ReadWrite,

    /// May not call any write endpoint.
    ReadOnly,

    /// May create links.
    WriteOnly,
}

impl Role {
    /// The role assigned to new clients that don't request one.
    pub const FALLBACK: Role = Role::WriteOnly;

    /// Report whether `candidate` is exactly one of the supported role names.
    pub fn is_role(candidate: &str) -> bool {
        candidate.parse::<Role>().is_ok()
    }

    /// List the supported role names.
    pub fn supported() -> Vec<&'static str> {
        Role::iter().map(<&'static str>::from).collect()
    }
}

/// Envelope wrapping the body of every successful write response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct ApiResponse<T> {
    /// Human readable summary.
    #[builder(into)]
    pub message: String,

    /// The created resource.
    pub details: T,
}

/// Request to create a shortened link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct CreateLinkRequest {
    /// The URL the link redirects to.
    #[builder(into)]
    pub redirect_url: String,

    /// The namespace the link belongs to; the default namespace if omitted.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// How long the link stays alive, e.g. `12h` or `34d`.
    ///
    /// Older clients send this as `empires_int`.
    #[builder(into)]
    #[serde(default, alias = "empires_int", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
}

/// A link that was just created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct LinkCreated {
    /// The externally visible shortened URL.
    #[builder(into)]
    pub short_url: String,

    /// The generated identifier.
    #[builder(into)]
    pub identifier: String,

    /// The namespace the caller supplied, if any.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_seconds: Option<i64>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<OffsetDateTime>,
}

/// Request to create an API client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Builder, Default)]
#[non_exhaustive]
pub struct CreateClientRequest {
    /// The role of the new client; the server picks [`Role::FALLBACK`] if
    /// omitted.
    ///
    /// This is a plain string so that the server can report unsupported
    /// roles instead of failing deserialization.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,

    /// A label for the owner of the client.
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A client that was just created.
///
/// This is the only time the signing key is ever returned.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Builder, derive_more::Debug)]
#[non_exhaustive]
pub struct ClientCreated {
    #[builder(into)]
    pub client_id: String,

    #[builder(into)]
    #[debug("..")]
    pub client_signing_key: String,

    pub role: Role,
}

impl From<&ClientCreated> for Credentials {
    fn from(created: &ClientCreated) -> Self {
        Credentials::new(&created.client_id, &created.client_signing_key)
    }
}
