//! API client creation.

use aerosol::axum::Dep;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clients::linkr::v1::{ApiResponse, ClientCreated, CreateClientRequest};
use tracing::info;

use crate::{
    auth::{ApiClient, AuthenticatedClient},
    db::Sqlite,
    error::Error,
    identity,
};

/// Create an API client. Admin only.
///
/// ## Endpoint
/// ```text
/// POST /v1/api/client/create
/// Linkr-Api-Key: <base64 client id>
/// Linkr-Digest: <base64url digest of the body>
/// Content-Type: application/json
///
/// { "client_type": "write-only", "username": "alice" }
/// ```
///
/// ## Responses
/// - 201: Client created; the body holds its signing key
/// - 400: Unknown role, or digest verification failed
/// - 403: Not authenticated, or not an admin
#[tracing::instrument(skip(db, request), fields(admin_id = %admin.id))]
pub async fn create(
    Dep(db): Dep<Sqlite>,
    admin: AuthenticatedClient,
    Json(request): Json<CreateClientRequest>,
) -> CreateClientResponse {
    let created = identity::create_client(
        &db,
        request.client_type.as_deref(),
        request.username.as_deref(),
    )
    .await;

    match created {
        Ok(client) => CreateClientResponse::Created(client),
        Err(error) => {
            info!(%error, "clients.create.rejected");
            CreateClientResponse::Error(error)
        }
    }
}

#[derive(Debug)]
pub enum CreateClientResponse {
    Created(ApiClient),
    Error(Error),
}

impl IntoResponse for CreateClientResponse {
    fn into_response(self) -> Response {
        match self {
            CreateClientResponse::Created(client) => {
                let details = ClientCreated::builder()
                    .client_id(client.id.as_str())
                    .client_signing_key(client.signing_key.expose())
                    .role(client.role)
                    .build();
                let body = ApiResponse::builder()
                    .message("client created")
                    .details(details)
                    .build();
                (StatusCode::CREATED, Json(body)).into_response()
            }
            CreateClientResponse::Error(error) => error.into_response(),
        }
    }
}
