//! The link lifecycle: validating a creation request, computing its
//! expiration, persisting it, and rendering the shortened URL.

use axum::http::HeaderMap;
use time::OffsetDateTime;
use tracing::info;

use crate::{
    crypto::generate_identifier,
    db::{Link, NewLink, Sqlite},
    error::Error,
    namespace::{NamespaceResolver, validate_tag},
};

pub mod duration;
pub mod headers;

pub use duration::DurationError;

/// Renders shortened URLs under a fixed base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shortener {
    base: String,
}

impl Shortener {
    pub fn new(base: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// `<base>/<identifier>`
    pub fn shorten(&self, identifier: &str) -> String {
        format!("{}/{}", self.base, identifier.trim_matches('/'))
    }

    /// `<base>/<namespace>/<identifier>`
    pub fn shorten_in(&self, namespace: &str, identifier: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base,
            namespace.trim_matches('/'),
            identifier.trim_matches('/')
        )
    }
}

/// A request to create a link, already authenticated and authorized.
#[derive(Clone, Debug, Default)]
pub struct CreateLink {
    pub destination_url: String,
    /// Empty for the default namespace.
    pub namespace: String,
    /// Empty for a link that never expires.
    pub expires_in: String,
    pub headers: HeaderMap,
}

/// A stored link together with its rendered URL.
#[derive(Clone, Debug)]
pub struct ShortenedLink {
    pub link: Link,
    pub short_url: String,
    /// The namespace tag the caller supplied, if any.
    pub namespace: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LinkManager {
    db: Sqlite,
    namespaces: NamespaceResolver,
    shortener: Shortener,
}

impl LinkManager {
    pub fn new(db: Sqlite, namespaces: NamespaceResolver, shortener: Shortener) -> Self {
        Self {
            db,
            namespaces,
            shortener,
        }
    }

    /// Create a link.
    ///
    /// Every validation runs before the first write, so a rejected request
    /// leaves no rows behind: not even a freshly named namespace. Identifiers
    /// aren't retried on collision; the store rejects the duplicate and the
    /// request fails.
    #[tracing::instrument(name = "LinkManager::create", skip(self, request), fields(namespace = %request.namespace))]
    pub async fn create(&self, request: CreateLink) -> Result<ShortenedLink, Error> {
        validate_tag(&request.namespace)?;
        let created_at = now();
        let expiry = match request.expires_in.trim() {
            "" => None,
            input => {
                let lifetime = duration::parse(input)
                    .map_err(|source| Error::InvalidDuration { source })?;
                let expires_at = created_at.checked_add(lifetime).ok_or_else(|| {
                    Error::InvalidDuration {
                        source: DurationError::Overflow {
                            input: input.to_string(),
                        },
                    }
                })?;
                Some((lifetime.whole_seconds(), expires_at))
            }
        };

        let namespace_id = self.namespaces.resolve(&request.namespace).await?;
        let identifier = generate_identifier();

        let link = self
            .db
            .create_link(NewLink {
                identifier,
                destination_url: request.destination_url,
                namespace_id,
                expires_in: expiry.map(|(seconds, _)| seconds),
                expires_at: expiry.map(|(_, expires_at)| expires_at),
                headers: headers::encode_forwarded(&request.headers),
                created_at,
            })
            .await?;

        let (short_url, namespace) = if request.namespace.is_empty() {
            (self.shortener.shorten(&link.identifier), None)
        } else {
            (
                self.shortener.shorten_in(&request.namespace, &link.identifier),
                Some(request.namespace),
            )
        };

        info!(
            identifier = %link.identifier,
            namespace_id = %link.namespace_id,
            expires_in = ?link.expires_in,
            "links.create.success"
        );
        Ok(ShortenedLink {
            link,
            short_url,
            namespace,
        })
    }

    /// Find the live link `identifier` in the namespace tagged `namespace`.
    ///
    /// Unknown namespaces, unknown identifiers and expired links are all
    /// [`Error::NotFound`].
    #[tracing::instrument(name = "LinkManager::follow", skip(self))]
    pub async fn follow(&self, namespace: &str, identifier: &str) -> Result<Link, Error> {
        let Some(namespace_id) = self.namespaces.lookup(namespace).await? else {
            return Err(Error::NotFound);
        };
        let link = self
            .db
            .find_link(namespace_id, identifier)
            .await?
            .ok_or(Error::NotFound)?;
        if link.is_expired(now()) {
            info!(identifier, expires_at = ?link.expires_at, "links.follow.expired");
            return Err(Error::NotFound);
        }
        Ok(link)
    }
}

/// The current time at the precision stored for links.
fn now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}
