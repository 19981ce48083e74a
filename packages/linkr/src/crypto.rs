//! Key material generation and digest verification.

use base64::Engine;
use clients::linkr::v1::{DigestClaims, digest::URL_SAFE_LENIENT};
use color_eyre::{Result, eyre::Context};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use rand::{Rng, RngCore};
use time::Date;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::{ClientId, SigningKey},
    error::Error,
};

/// Characters used in link identifiers; all of them are URL-safe.
const IDENTIFIER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated link identifiers, giving roughly 59 bits of entropy.
pub const IDENTIFIER_LENGTH: usize = 10;

/// Generate a new signing key with 256 bits of entropy.
///
/// The key is base64url encoded with padding; it is the form handed to
/// clients and the form stored in the database.
pub fn generate_signing_key() -> SigningKey {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    SigningKey::new(URL_SAFE_LENIENT.encode(bytes))
}

/// Generate a new client ID of the form `api_<unique token>-<YYYYMMDD>`.
///
/// The suffix is the creation date, which makes it easy to spot old keys.
pub fn generate_client_id(today: Date) -> ClientId {
    let token = Uuid::new_v4().simple();
    ClientId::new(format!(
        "api_{token}-{:04}{:02}{:02}",
        today.year(),
        u8::from(today.month()),
        today.day()
    ))
}

/// Generate a new random link identifier.
pub fn generate_identifier() -> String {
    let mut rng = rand::thread_rng();
    (0..IDENTIFIER_LENGTH)
        .map(|_| char::from(IDENTIFIER_ALPHABET[rng.gen_range(0..IDENTIFIER_ALPHABET.len())]))
        .collect()
}

/// Verifies request digests produced with a single client's signing key.
#[derive(Clone)]
pub struct DigestVerifier {
    key: DecodingKey,
}

impl DigestVerifier {
    pub fn new(signing_key: &SigningKey) -> Result<Self> {
        let secret = URL_SAFE_LENIENT
            .decode(signing_key.expose())
            .context("decode signing key")?;
        Ok(Self {
            key: DecodingKey::from_secret(&secret),
        })
    }

    /// Verify that `digest` was signed with this key for `subject` and that
    /// it covers exactly `body`.
    ///
    /// A digest that can't be decoded at all is an authentication failure;
    /// one that decodes but doesn't check out fails payload verification.
    pub fn verify(&self, digest: &[u8], body: &[u8], subject: &ClientId) -> Result<(), Error> {
        let token = URL_SAFE_LENIENT
            .decode(digest)
            .ok()
            .and_then(|token| String::from_utf8(token).ok())
            .ok_or(Error::InvalidAuthentication)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub"]);
        validation.sub = Some(subject.to_string());
        validation.validate_aud = false;

        let claims = jsonwebtoken::decode::<DigestClaims>(&token, &self.key, &validation)
            .map_err(|error| {
                debug!(?error, "auth.digest.rejected");
                match error.kind() {
                    ErrorKind::InvalidToken
                    | ErrorKind::Base64(_)
                    | ErrorKind::Json(_)
                    | ErrorKind::Utf8(_) => Error::InvalidAuthentication,
                    _ => Error::PayloadVerificationFailed,
                }
            })?
            .claims;

        if claims.body.as_bytes() != body {
            debug!(%subject, "auth.digest.body_mismatch");
            return Err(Error::PayloadVerificationFailed);
        }
        Ok(())
    }
}
