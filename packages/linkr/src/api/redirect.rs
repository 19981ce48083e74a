//! Following shortened links. These routes are public.

use aerosol::axum::Dep;
use axum::{
    Router,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use crate::{api::State, error::Error, link::LinkManager};

pub fn router() -> Router<State> {
    Router::new()
        .route("/{identifier}", get(in_default_namespace))
        .route("/{namespace}/{identifier}", get(in_namespace))
}

/// `GET /{identifier}`: follow a link in the default namespace.
#[tracing::instrument(skip(links))]
pub async fn in_default_namespace(
    Dep(links): Dep<LinkManager>,
    Path(identifier): Path<String>,
) -> RedirectResponse {
    follow(&links, "", &identifier).await
}

/// `GET /{namespace}/{identifier}`: follow a link in a named namespace.
#[tracing::instrument(skip(links))]
pub async fn in_namespace(
    Dep(links): Dep<LinkManager>,
    Path((namespace, identifier)): Path<(String, String)>,
) -> RedirectResponse {
    follow(&links, &namespace, &identifier).await
}

async fn follow(links: &LinkManager, namespace: &str, identifier: &str) -> RedirectResponse {
    match links.follow(namespace, identifier).await {
        Ok(link) => RedirectResponse::Found(link.destination_url),
        Err(error) => RedirectResponse::Error(error),
    }
}

#[derive(Debug)]
pub enum RedirectResponse {
    /// Redirect with 307, preserving the method.
    Found(String),
    Error(Error),
}

impl IntoResponse for RedirectResponse {
    fn into_response(self) -> Response {
        match self {
            RedirectResponse::Found(destination) => {
                Redirect::temporary(&destination).into_response()
            }
            RedirectResponse::Error(error) => error.into_response(),
        }
    }
}
