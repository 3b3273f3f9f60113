use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

use sharezone_types::api::{Claims, ErrorResponse, Principal};

/// Resolution itself failed, as opposed to finding no principal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication is not configured")]
    MissingSecret,
    #[error("Token verification failed: {0}")]
    Verification(String),
}

/// Resolves the principal behind a request from its headers.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<Option<Principal>, AuthError>;
}

pub type SharedResolver = Arc<dyn IdentityResolver>;

/// Bearer JWT resolver. Missing, expired or forged tokens yield no principal.
pub struct JwtResolver {
    secret: String,
}

impl JwtResolver {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl IdentityResolver for JwtResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<Option<Principal>, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
            return Ok(None);
        };

        match decode::<Claims>(
            bearer.token(),
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(data) => Ok(Some(Principal {
                user_id: data.claims.sub,
            })),
            Err(e) => match e.kind() {
                ErrorKind::InvalidKeyFormat | ErrorKind::Crypto(_) => {
                    Err(AuthError::Verification(e.to_string()))
                }
                _ => {
                    debug!("Rejected bearer token: {}", e);
                    Ok(None)
                }
            },
        }
    }
}

/// Identity gate. Runs before every message and connection handler.
///
/// No principal: 401 `{ message: "Not Authenticated" }`.
/// Resolver error: `{ success: false, message }`, handler not invoked.
pub async fn require_auth(
    State(resolver): State<SharedResolver>,
    mut req: Request,
    next: Next,
) -> Response {
    match resolver.resolve(req.headers()) {
        Ok(Some(principal)) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not Authenticated" })),
        )
            .into_response(),
        Err(e) => {
            warn!("Identity resolution failed: {}", e);
            Json(ErrorResponse {
                success: false,
                message: e.to_string(),
            })
            .into_response()
        }
    }
}
