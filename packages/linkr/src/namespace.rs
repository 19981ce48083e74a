//! Mapping caller-supplied namespace tags onto stored namespaces.
//!
//! An empty tag means the default namespace. The default namespace's own tag
//! ([`RESERVED_NAMESPACE`]) is reserved: callers can never name it.

use clients::linkr::v1::RESERVED_NAMESPACE;

use crate::{
    db::{NamespaceId, Sqlite},
    error::Error,
};

/// The ID of the default namespace, resolved once at startup.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DefaultNamespace(pub NamespaceId);

/// Reject the reserved namespace tag, and any tag that wouldn't survive
/// as exactly one path segment of a shortened URL.
pub fn validate_tag(tag: &str) -> Result<(), Error> {
    if tag == RESERVED_NAMESPACE {
        return Err(Error::ReservedNamespace);
    }
    if tag.is_empty() {
        return Ok(());
    }

    let unroutable = matches!(tag, "." | "..")
        || tag.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#' | '%')
        });
    if unroutable {
        Err(Error::InvalidNamespace {
            tag: tag.to_string(),
        })
    } else {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct NamespaceResolver {
    db: Sqlite,
    default: DefaultNamespace,
}

impl NamespaceResolver {
    pub fn new(db: Sqlite, default: DefaultNamespace) -> Self {
        Self { db, default }
    }

    pub fn default_namespace(&self) -> NamespaceId {
        self.default.0
    }

    /// Resolve `tag` for writing, creating the namespace on first use.
    #[tracing::instrument(name = "NamespaceResolver::resolve", skip(self))]
    pub async fn resolve(&self, tag: &str) -> Result<NamespaceId, Error> {
        validate_tag(tag)?;
        if tag.is_empty() {
            return Ok(self.default.0);
        }
        Ok(self.db.get_or_create_namespace(tag).await?)
    }

    /// Resolve `tag` for reading; unknown namespaces are `None`.
    #[tracing::instrument(name = "NamespaceResolver::lookup", skip(self))]
    pub async fn lookup(&self, tag: &str) -> Result<Option<NamespaceId>, Error> {
        validate_tag(tag)?;
        if tag.is_empty() {
            return Ok(Some(self.default.0));
        }
        Ok(self.db.namespace_by_tag(tag).await?)
    }
}
