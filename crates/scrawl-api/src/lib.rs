//! HTTP surface: handlers, auth gates and the route table.

pub mod admin;
pub mod auth;
pub mod credentials;
pub mod entries;
pub mod error;
pub mod middleware;
pub mod token;

pub use auth::{AppState, AppStateInner};

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the full route table around a shared state, split by guard:
/// public, token-required and admin-gated, merged into one router.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/entries/wall", get(entries::wall))
        .with_state(state.clone());

    let user_routes = Router::new()
        .route("/entries", get(entries::list_own).post(entries::create))
        .route("/entries/{id}", put(entries::update).delete(entries::delete))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state.clone());

    // Layers run outermost-last, so the token gate added last fires before
    // the admin gate.
    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_accounts))
        .route("/admin/user/{id}", delete(admin::delete_account))
        .route("/admin/stats", get(admin::stats))
        .layer(from_fn_with_state(state.clone(), middleware::require_admin))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
