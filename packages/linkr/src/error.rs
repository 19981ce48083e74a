//! Errors surfaced by the Linkr request pipeline.
//!
//! Every variant maps to exactly one HTTP status. Server-side failures are
//! logged with their full report and rendered to the caller as an opaque
//! message so that storage details never leak.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use color_eyre::eyre::Report;
use derive_more::{Display, Error};
use tracing::error;

use crate::{auth::Role, link::DurationError};

/// The message returned for every server-side failure.
pub const INTERNAL_MESSAGE: &str = "something went wrong. please try again later";

#[derive(Debug, Display, Error)]
pub enum Error {
    /// A role name outside the supported set.
    #[display("unknown role type '{role}'. supported roles are {}", Role::supported().join(", "))]
    InvalidRole { role: String },

    /// The caller tried to address the default namespace by name.
    #[display("invalid or unsupported namespace")]
    ReservedNamespace,

    /// A namespace tag that can't be a single URL path segment.
    #[display("invalid or unsupported namespace '{tag}'")]
    InvalidNamespace { tag: String },

    #[display("couldn't construct duration from `expires_in` input: {source}")]
    InvalidDuration { source: DurationError },

    /// Missing or malformed credentials, or an unknown client.
    #[display("invalid authentication")]
    InvalidAuthentication,

    /// The digest did not verify against the client's key or the body.
    #[display("failed to verify payload")]
    PayloadVerificationFailed,

    #[display("operation not allowed")]
    Forbidden,

    /// A role gate ran on a request the authenticator never saw.
    #[display("authenticated client is not attached to the request")]
    MissingAuthContext,

    #[display("url not found")]
    NotFound,

    #[display("store failure: {report}")]
    StoreFailure {
        #[error(not(source))]
        report: Report,
    },
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidRole { .. }
            | Error::ReservedNamespace
            | Error::InvalidNamespace { .. }
            | Error::InvalidDuration { .. }
            | Error::PayloadVerificationFailed => StatusCode::BAD_REQUEST,
            Error::InvalidAuthentication | Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::MissingAuthContext | Error::StoreFailure { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<Report> for Error {
    fn from(report: Report) -> Self {
        Error::StoreFailure { report }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if !status.is_server_error() {
            return (status, self.to_string()).into_response();
        }

        match &self {
            Error::StoreFailure { report } => error!(?report, "request.store_failure"),
            other => error!(error = %other, "request.internal_error"),
        }
        (status, INTERNAL_MESSAGE).into_response()
    }
}
