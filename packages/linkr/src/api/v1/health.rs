use aerosol::axum::Dep;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use color_eyre::eyre::Report;
use tracing::error;

use crate::{db::Sqlite, error::INTERNAL_MESSAGE};

/// Health check endpoint.
///
/// Responds only once the database answers a ping.
#[tracing::instrument]
pub async fn handle(Dep(db): Dep<Sqlite>) -> PingResponse {
    match db.ping().await {
        Ok(()) => PingResponse::Success,
        Err(err) => {
            error!(?err, "health.ping.error");
            PingResponse::Error(err)
        }
    }
}

#[derive(Debug)]
pub enum PingResponse {
    Success,
    Error(Report),
}

impl IntoResponse for PingResponse {
    fn into_response(self) -> Response {
        match self {
            PingResponse::Success => (StatusCode::OK, "ok").into_response(),
            PingResponse::Error(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE).into_response()
            }
        }
    }
}
