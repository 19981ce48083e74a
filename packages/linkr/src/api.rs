//! HTTP surface of the service.
//!
//! ## Dependency injection
//!
//! Handlers receive their dependencies through [`aerosol`][^1]. [`State`]
//! lists what is available; when building it, provide the items in reverse
//! order of the list. Handlers extract items with the
//! [`Dep`](aerosol::axum::Dep) extractor.
//!
//! [^1]: https://docs.rs/aerosol
//!
//! ## Response types
//!
//! Handlers return a response enum per endpoint implementing
//! [`IntoResponse`](axum::response::IntoResponse), so every outcome an
//! endpoint can produce is visible in one place.

use std::time::Duration;

use aerosol::Aero;
use axum::{
    Router,
    http::{
        HeaderName, Method, StatusCode,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
};
use color_eyre::Result;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    db::Sqlite,
    link::{LinkManager, Shortener},
    namespace::{DefaultNamespace, NamespaceResolver},
};

pub mod redirect;
pub mod v1;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

pub type State = Aero![crate::db::Sqlite, crate::link::LinkManager];

/// Assemble the application router.
///
/// Fails if a route's role gate is misconfigured.
pub fn router(db: Sqlite, default_namespace: DefaultNamespace, shortener: Shortener) -> Result<Router> {
    let namespaces = NamespaceResolver::new(db.clone(), default_namespace);
    let links = LinkManager::new(db.clone(), namespaces, shortener);
    let state: State = Aero::new().with(links).with(db.clone());

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(cors());

    Ok(Router::new()
        .nest("/v1", v1::router(db)?)
        .merge(redirect::router())
        .layer(middleware)
        .with_state(state))
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
}
