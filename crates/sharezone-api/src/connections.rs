use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::{info, warn};

use sharezone_db::models::UserRow;
use sharezone_types::api::{AckResponse, ConnectRequest, ConnectionsResponse, Principal};
use sharezone_types::models::Profile;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// POST /api/user/connect — connect the principal with another user.
pub async fn connect(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ConnectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.id == principal.user_id {
        return Err(ApiError::BadRequest("Cannot connect with yourself".into()));
    }

    let db = state.clone();
    let me = principal.user_id.to_string();
    let other = req.id.to_string();
    let found = run_blocking(move || {
        if !db.db.user_exists(&other)? {
            return Ok(false);
        }
        db.db.connect_users(&me, &other)?;
        Ok(true)
    })
    .await?;

    if !found {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!("{} connected with {}", principal.user_id, req.id);
    Ok(Json(AckResponse {
        success: true,
        message: "Connection established".into(),
    }))
}

/// GET /api/user/connections — profiles of everyone the principal is connected with.
pub async fn list_connections(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let me = principal.user_id.to_string();
    let rows = run_blocking(move || db.db.get_connections(&me)).await?;

    Ok(Json(ConnectionsResponse {
        success: true,
        connections: rows.into_iter().filter_map(profile_from_row).collect(),
    }))
}

fn profile_from_row(row: UserRow) -> Option<Profile> {
    match row.id.parse() {
        Ok(id) => Some(Profile {
            id,
            full_name: row.full_name,
            username: row.username,
            profile_picture: row.profile_picture,
        }),
        Err(e) => {
            warn!("Corrupt user id '{}': {}", row.id, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::test_support::{TestServer, get_request, json_request};

    #[tokio::test]
    async fn connections_are_listed_for_both_sides() {
        let server = TestServer::new();
        let (alice, alice_token) = server.user("alice");
        let (bob, bob_token) = server.user("bob");

        let (status, _) = server
            .call(json_request("/api/user/connect", Some(&alice_token), &json!({ "id": bob })))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = server.call(get_request("/api/user/connections", &bob_token)).await;
        let listed: ConnectionsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(listed.connections.len(), 1);
        assert_eq!(listed.connections[0].id, alice);
        assert_eq!(listed.connections[0].username, "alice");
    }

    #[tokio::test]
    async fn connecting_to_unknown_user_fails() {
        let server = TestServer::new();
        let (_, token) = server.user("alice");

        let (status, body) = server
            .call(json_request("/api/user/connect", Some(&token), &json!({ "id": Uuid::new_v4() })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
