//! Request signing.
//!
//! Every write request carries two headers:
//! - [`API_KEY_HEADER`](super::API_KEY_HEADER): the client ID, standard base64.
//! - [`DIGEST_HEADER`](super::DIGEST_HEADER): an HS256 JWT over the exact
//!   request body, keyed with the client's signing key and with the client ID
//!   as its subject, then base64url encoded.
//!
//! Because the body is part of the signed claims, a digest can't be replayed
//! against a different payload even if the API key leaks.

use std::time::Duration;

use base64::{
    Engine, alphabet,
    engine::{
        DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig,
        general_purpose::STANDARD,
    },
};
use color_eyre::{Result, eyre::Context};
use derive_more::Debug;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Base64url engine that writes padding but accepts input with or without it.
pub const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// How long a digest produced by [`Credentials::sign`] stays valid.
pub const DIGEST_TTL: Duration = Duration::from_secs(5 * 60);

/// The claims carried by a digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestClaims {
    /// The client ID of the signer.
    pub sub: String,

    /// The exact request body.
    #[debug("..")]
    pub body: String,

    /// Expiration as unix seconds; digests without one never expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Issue time as unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl DigestClaims {
    /// Claims for `body` signed by `client_id`, without an expiration.
    pub fn new(client_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sub: client_id.into(),
            body: body.into(),
            exp: None,
            iat: None,
        }
    }

    /// Set the issue time to now and expire the claims after `ttl`.
    pub fn expiring_in(self, ttl: Duration) -> Self {
        let now = unix_now();
        Self {
            iat: Some(now),
            exp: Some(now.saturating_add(ttl.as_secs())),
            ..self
        }
    }
}

/// The credentials of an API client.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Credentials {
    pub client_id: String,

    #[debug("..")]
    pub signing_key: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, signing_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            signing_key: signing_key.into(),
        }
    }

    /// Sign a request body, producing a digest valid for [`DIGEST_TTL`].
    ///
    /// The body must be UTF-8 since it is embedded in the JWT claims.
    pub fn sign(&self, body: impl AsRef<[u8]>) -> Result<Signature> {
        let body = std::str::from_utf8(body.as_ref()).context("request body must be UTF-8")?;
        let claims = DigestClaims::new(&self.client_id, body).expiring_in(DIGEST_TTL);
        self.sign_claims(&claims)
    }

    /// Sign arbitrary claims with this client's signing key.
    ///
    /// Mostly useful for tests; prefer [`Credentials::sign`].
    pub fn sign_claims(&self, claims: &DigestClaims) -> Result<Signature> {
        let secret = URL_SAFE_LENIENT
            .decode(&self.signing_key)
            .context("decode signing key")?;
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&secret),
        )
        .context("encode digest")?;

        Ok(Signature {
            api_key: STANDARD.encode(&self.client_id),
            digest: URL_SAFE_LENIENT.encode(token),
        })
    }
}

/// The header values authenticating a single request.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Signature {
    /// Value for [`API_KEY_HEADER`](super::API_KEY_HEADER).
    pub api_key: String,

    /// Value for [`DIGEST_HEADER`](super::DIGEST_HEADER).
    #[debug("..")]
    pub digest: String,
}

fn unix_now() -> u64 {
    u64::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or_default()
}
