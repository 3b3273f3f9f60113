use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, Profile};

// -- JWT Claims --

/// JWT claims issued by the auth endpoints and checked by the identity gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

/// Identity attached to a request once the gate has resolved it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Messages --

/// Body of the history fetch: the peer whose conversation is requested.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub to_user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: Message,
}

// -- Connections --

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionsResponse {
    pub success: bool,
    pub connections: Vec<Profile>,
}

/// Plain acknowledgement for mutations that return no resource.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

// -- Failures --

/// Failure envelope. `success` is omitted by the 401 gate response, hence the default.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    pub message: String,
}
