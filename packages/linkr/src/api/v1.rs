use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use color_eyre::Result;

use crate::{
    api::State,
    auth::{RequireRoles, authenticate, require_roles},
    db::Sqlite,
};

pub mod clients;
pub mod health;
pub mod links;

pub fn router(db: Sqlite) -> Result<Router<State>> {
    let link_writers = RequireRoles::parse(["read-write", "write-only", "admin"])?;
    let admins = RequireRoles::parse(["admin"])?;

    // Layers added later run first: authentication wraps the role gates.
    let api = Router::new()
        .merge(
            Router::new()
                .route("/create", post(links::create))
                .route_layer(from_fn_with_state(link_writers, require_roles)),
        )
        .merge(
            Router::new()
                .route("/client/create", post(clients::create))
                .route_layer(from_fn_with_state(admins, require_roles)),
        )
        .route_layer(from_fn_with_state(db, authenticate));

    Ok(Router::new()
        .route("/health", get(health::handle))
        .nest("/api", api))
}
