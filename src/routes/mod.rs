//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the REST surface and the websocket endpoint under a single Axum
//! router. REST handlers authenticate per request via the `AuthUser`
//! extractor; the websocket endpoint authenticates once at upgrade.

pub mod auth;
pub mod boards;
pub mod postits;
pub mod users;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/google", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/api/auth/me", get(auth::me))
        .route("/api/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/api/boards/{id}",
            get(boards::get_board)
                .put(boards::update_board)
                .delete(boards::delete_board),
        )
        .route("/api/boards/{id}/share", post(boards::share_board))
        .route("/api/postits", get(postits::list_postits).post(postits::create_postit))
        .route(
            "/api/postits/{id}",
            get(postits::get_postit)
                .put(postits::update_postit)
                .delete(postits::delete_postit),
        )
        .route("/api/users", get(users::list_users))
        .route("/api/users/me", get(users::me))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
