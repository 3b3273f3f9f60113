use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use sharezone_db::Database;
use sharezone_gateway::dispatcher::Dispatcher;

use crate::auth::{AppState, AppStateInner, UploadSettings, create_token};
use crate::middleware::JwtResolver;
use crate::router;

const SECRET: &str = "test-secret";
const BOUNDARY: &str = "sharezone-test-boundary";

pub struct TestServer {
    pub state: AppState,
    app: Router,
}

impl TestServer {
    pub fn new() -> Self {
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: SECRET.into(),
            dispatcher: Dispatcher::new(),
            uploads: UploadSettings {
                dir: std::env::temp_dir().join(format!("sharezone-test-{}", Uuid::new_v4())),
                public_url: "http://localhost:4000/".into(),
            },
        });
        let app = router(state.clone(), Arc::new(JwtResolver::new(SECRET)));
        Self { state, app }
    }

    /// Insert a user directly and mint a token for them.
    pub fn user(&self, username: &str) -> (Uuid, String) {
        let id = Uuid::new_v4();
        self.state
            .db
            .create_user(&id.to_string(), username, &username.to_uppercase(), "unused-hash")
            .unwrap();
        (id, create_token(SECRET, id, username).unwrap())
    }

    pub async fn call(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }
}

pub struct ImageFixture<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

pub fn json_request(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn multipart_request(token: &str, fields: &[(&str, &str)], file: Option<ImageFixture<'_>>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/message/send")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}
