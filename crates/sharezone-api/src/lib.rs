pub mod auth;
pub mod connections;
pub mod error;
pub mod messages;
pub mod middleware;

#[cfg(test)]
mod test_support;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tracing::error;

use sharezone_gateway::stream;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::{SharedResolver, require_auth};

/// All `/api` routes. Everything except register/login sits behind the identity gate.
pub fn router(state: AppState, resolver: SharedResolver) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .with_state(state.clone());

    let stream_routes = Router::new()
        .route("/api/message/stream", get(stream::message_stream))
        .with_state(state.dispatcher.clone());

    let protected_routes = Router::new()
        .route(
            "/api/message/send",
            post(messages::send_message).layer(DefaultBodyLimit::max(messages::MAX_SEND_BODY)),
        )
        .route("/api/message/get", post(messages::get_messages))
        .route("/api/user/connect", post(connections::connect))
        .route("/api/user/connections", get(connections::list_connections))
        .with_state(state)
        .merge(stream_routes)
        .layer(axum::middleware::from_fn_with_state(resolver, require_auth));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::from)
}
