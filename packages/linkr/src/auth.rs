//! Request authentication and role-based authorization.
//!
//! Write endpoints sit behind two middleware layers:
//!
//! 1. [`authenticate`] identifies the calling client from the
//!    `Linkr-Api-Key` header, verifies the `Linkr-Digest` header against the
//!    exact request body, and attaches an [`AuthenticatedClient`] to the
//!    request.
//! 2. [`require_roles`] rejects the request unless the attached client holds
//!    one of the roles configured in its [`RequireRoles`] gate.
//!
//! Handlers then extract [`AuthenticatedClient`] directly.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use clients::linkr::v1::{API_KEY_HEADER, DIGEST_HEADER};
use color_eyre::eyre::Context;
use derive_more::{Debug, Display};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::{api::MAX_BODY_SIZE, crypto::DigestVerifier, db::Sqlite, error::Error};

pub use clients::linkr::v1::Role;

/// An ID uniquely identifying an API client.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The base64url encoded secret a client signs its requests with.
#[derive(Clone, Eq, PartialEq, Debug)]
#[debug("SigningKey(..)")]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// View the key in its encoded form.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// An API client as stored in the database.
#[derive(Clone, Debug)]
pub struct ApiClient {
    pub id: ClientId,
    pub role: Role,
    pub signing_key: SigningKey,
    pub username: Option<String>,
    pub created_at: OffsetDateTime,
}

/// The client a request was authenticated as.
///
/// Only [`authenticate`] produces this; handlers behind it can extract it.
#[derive(Clone, Debug)]
pub struct AuthenticatedClient {
    pub id: ClientId,
    pub role: Role,
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedClient {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedClient>()
            .cloned()
            .ok_or(Error::MissingAuthContext)
    }
}

/// Authenticate a request from its headers and raw body.
#[tracing::instrument(name = "auth::verify_request", skip_all)]
pub async fn verify_request(
    db: &Sqlite,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<AuthenticatedClient, Error> {
    let (Some(api_key), Some(digest)) = (headers.get(API_KEY_HEADER), headers.get(DIGEST_HEADER))
    else {
        debug!("auth.authenticate.missing_headers");
        return Err(Error::InvalidAuthentication);
    };

    let Some(client_id) = STANDARD
        .decode(api_key.as_bytes())
        .ok()
        .and_then(|id| String::from_utf8(id).ok())
        .map(ClientId::new)
    else {
        debug!("auth.authenticate.malformed_api_key");
        return Err(Error::InvalidAuthentication);
    };

    let Some(client) = db.get_client(&client_id).await? else {
        info!(%client_id, "auth.authenticate.unknown_client");
        return Err(Error::InvalidAuthentication);
    };

    let verifier = DigestVerifier::new(&client.signing_key)
        .with_context(|| format!("load signing key for {client_id}"))?;
    verifier.verify(digest.as_bytes(), body, &client.id)?;

    Ok(AuthenticatedClient {
        id: client.id,
        role: client.role,
    })
}

/// Middleware authenticating signed requests.
///
/// The body is buffered so the digest can be checked against it, then
/// handed on to the inner service unchanged.
pub async fn authenticate(State(db): State<Sqlite>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_SIZE).await {
        Ok(body) => body,
        Err(error) => {
            warn!(?error, "auth.authenticate.read_body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    match verify_request(&db, &parts.headers, &body).await {
        Ok(client) => {
            debug!(client_id = %client.id, role = %client.role, "auth.authenticate.success");
            parts.extensions.insert(client);
            next.run(Request::from_parts(parts, Body::from(body))).await
        }
        Err(error) => error.into_response(),
    }
}

/// A gate admitting authenticated clients that hold one of a set of roles.
#[derive(Clone, Debug)]
pub struct RequireRoles {
    allowed: Arc<[Role]>,
}

impl RequireRoles {
    /// Build a gate from role names.
    ///
    /// Every name must be a supported role; this is checked once when the
    /// router is assembled rather than on each request.
    pub fn parse<I, S>(names: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                name.parse::<Role>().map_err(|_| Error::InvalidRole {
                    role: name.to_string(),
                })
            })
            .collect::<Result<Arc<[Role]>, Error>>()?;
        Ok(Self { allowed })
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    /// Decide whether the request's client may proceed.
    pub fn check(&self, client: Option<&AuthenticatedClient>) -> Result<(), Error> {
        let client = client.ok_or(Error::MissingAuthContext)?;
        if self.allows(client.role) {
            Ok(())
        } else {
            info!(client_id = %client.id, role = %client.role, "auth.require_roles.forbidden");
            Err(Error::Forbidden)
        }
    }
}

/// Middleware enforcing a [`RequireRoles`] gate.
///
/// Must run after [`authenticate`].
pub async fn require_roles(
    State(gate): State<RequireRoles>,
    request: Request,
    next: Next,
) -> Response {
    match gate.check(request.extensions().get::<AuthenticatedClient>()) {
        Ok(()) => next.run(request).await,
        Err(error) => error.into_response(),
    }
}
