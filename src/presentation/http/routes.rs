//! The route tree: `/api` for the JSON surface, `/media` for uploaded
//! images, plus the health and metrics probes at the root.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::services::ServeDir;

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::sse::events_handler;
use crate::startup::AppState;

/// Assemble the full router over the shared [`AppState`].
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(state.clone()))
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .route("/metrics", get(metrics_handler))
        // Uploaded images, served from the media root
        .nest_service("/media", ServeDir::new(state.media.root()))
        .with_state(state)
}

/// Render the Prometheus registry in text exposition format.
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// Everything under `/api`. Auth and the skill vocabulary are public,
/// the rest sits behind the bearer-token middleware.
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .route("/skills", get(handlers::skill::list_skills))
        .nest("/offers", offer_routes(state.clone()))
        .nest("/chats", chat_routes(state.clone()))
        .nest("/messages", message_routes(state))
        // SSE endpoint authenticates inline, the token may arrive by query
        .route("/events", get(events_handler))
}

/// Authentication routes. The session endpoints are public, the profile
/// pair requires a valid token.
fn auth_routes(state: AppState) -> Router<AppState> {
    let session = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/signin", post(handlers::auth::signin))
        .route("/signout", post(handlers::auth::signout))
        .route("/refresh", post(handlers::auth::refresh_token));

    let profile = Router::new()
        .route("/profile", get(handlers::user::get_profile))
        .route("/profile", put(handlers::user::update_profile))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    session.merge(profile)
}

fn offer_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::offer::list_offers))
        .route("/", post(handlers::offer::create_offer))
        .route("/{offer_id}", get(handlers::offer::get_offer))
        .route("/{offer_id}", patch(handlers::offer::update_offer))
        .route("/{offer_id}", put(handlers::offer::update_offer))
        .route("/{offer_id}", delete(handlers::offer::delete_offer))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn chat_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::chat::list_chats))
        .route("/", post(handlers::chat::create_chat))
        .route("/{chat_id}", delete(handlers::chat::delete_chat))
        .route("/{chat_id}/messages", get(handlers::chat::list_chat_messages))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn message_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::message::send_message))
        .route("/{message_id}/mark_read", post(handlers::message::mark_read))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
