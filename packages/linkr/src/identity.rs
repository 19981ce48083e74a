//! Issuing new API clients.

use time::OffsetDateTime;
use tracing::info;

use crate::{
    auth::{ApiClient, Role},
    crypto::{generate_client_id, generate_signing_key},
    db::Sqlite,
    error::Error,
};

/// Create and store a new API client.
///
/// An empty or missing `requested_role` gets [`Role::FALLBACK`]; anything
/// else must name a supported role exactly. The returned client carries the
/// plaintext signing key, which is never retrievable again through the API.
#[tracing::instrument(name = "identity::create_client", skip(db))]
pub async fn create_client(
    db: &Sqlite,
    requested_role: Option<&str>,
    username: Option<&str>,
) -> Result<ApiClient, Error> {
    let role = match requested_role.filter(|role| !role.is_empty()) {
        None => Role::FALLBACK,
        Some(role) => role.parse::<Role>().map_err(|_| Error::InvalidRole {
            role: role.to_string(),
        })?,
    };

    let created_at = OffsetDateTime::now_utc();
    let client = ApiClient {
        id: generate_client_id(created_at.date()),
        role,
        signing_key: generate_signing_key(),
        username: username.filter(|name| !name.is_empty()).map(String::from),
        created_at,
    };
    db.create_client(&client).await?;

    info!(client_id = %client.id, %role, "clients.create.success");
    Ok(client)
}
