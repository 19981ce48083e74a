//! Link creation.

use aerosol::axum::Dep;
use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use clients::linkr::v1::{ApiResponse, CreateLinkRequest, LinkCreated};
use tracing::info;

use crate::{
    auth::AuthenticatedClient,
    error::Error,
    link::{CreateLink, LinkManager, ShortenedLink},
};

/// Create a shortened link.
///
/// ## Endpoint
/// ```text
/// POST /v1/api/create
/// Linkr-Api-Key: <base64 client id>
/// Linkr-Digest: <base64url digest of the body>
/// Linkr-Forward-<Name>: <value>   (optional, stored with the link)
/// Content-Type: application/json
///
/// { "redirect_url": "https://example.com", "namespace": "abc", "expires_in": "1h" }
/// ```
///
/// ## Responses
/// - 201: Link created
/// - 400: Reserved or malformed namespace, invalid duration, or digest verification failed
/// - 403: Not authenticated, or role may not create links
#[tracing::instrument(skip(links, headers, request), fields(client_id = %client.id))]
pub async fn create(
    Dep(links): Dep<LinkManager>,
    client: AuthenticatedClient,
    headers: HeaderMap,
    Json(request): Json<CreateLinkRequest>,
) -> CreateLinkResponse {
    let request = CreateLink {
        destination_url: request.redirect_url,
        namespace: request.namespace.unwrap_or_default(),
        expires_in: request.expires_in.unwrap_or_default(),
        headers,
    };

    match links.create(request).await {
        Ok(created) => CreateLinkResponse::Created(created),
        Err(error) => {
            info!(%error, "links.create.rejected");
            CreateLinkResponse::Error(error)
        }
    }
}

#[derive(Debug)]
pub enum CreateLinkResponse {
    Created(ShortenedLink),
    Error(Error),
}

impl IntoResponse for CreateLinkResponse {
    fn into_response(self) -> Response {
        match self {
            CreateLinkResponse::Created(created) => {
                let details = LinkCreated::builder()
                    .short_url(created.short_url)
                    .identifier(created.link.identifier)
                    .maybe_namespace(created.namespace)
                    .maybe_expires_in_seconds(created.link.expires_in)
                    .created_at(created.link.created_at)
                    .maybe_expires_at(created.link.expires_at)
                    .build();
                let body = ApiResponse::builder()
                    .message("link created")
                    .details(details)
                    .build();
                (StatusCode::CREATED, Json(body)).into_response()
            }
            CreateLinkResponse::Error(error) => error.into_response(),
        }
    }
}
