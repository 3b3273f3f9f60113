use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use reqwest::{Client, StatusCode, multipart};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use sharezone_types::api::{
    ConnectRequest, ConnectionsResponse, ErrorResponse, HistoryRequest, HistoryResponse,
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SendMessageResponse,
};
use sharezone_types::events::GatewayEvent;
use sharezone_types::models::{Message, Profile};

use crate::api::MessagingApi;
use crate::draft::ImageAttachment;
use crate::error::ClientError;
use crate::sse::SseDecoder;

/// reqwest client for the Sharezone HTTP API.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ClientError> {
        let resp = self.client.post(self.url("/api/auth/register")).json(req).send().await?;
        decode(resp).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let resp = self.client.post(self.url("/api/auth/login")).json(req).send().await?;
        decode(resp).await
    }

    pub async fn connect(&self, token: &str, id: Uuid) -> Result<(), ClientError> {
        let resp = self
            .client
            .post(self.url("/api/user/connect"))
            .bearer_auth(token)
            .json(&ConnectRequest { id })
            .send()
            .await?;
        decode::<serde_json::Value>(resp).await.map(|_| ())
    }

    pub async fn connections(&self, token: &str) -> Result<Vec<Profile>, ClientError> {
        let resp = self
            .client
            .get(self.url("/api/user/connections"))
            .bearer_auth(token)
            .send()
            .await?;
        let body: ConnectionsResponse = decode(resp).await?;
        Ok(body.connections)
    }

    /// Open the live message stream. Yields every event the server pushes
    /// until the connection drops.
    pub async fn open_stream(
        &self,
        token: &str,
    ) -> Result<BoxStream<'static, Result<GatewayEvent, ClientError>>, ClientError> {
        let resp = self
            .client
            .get(self.url("/api/message/stream"))
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(decode_body::<serde_json::Value>(status, &body).err().unwrap_or_else(|| {
                ClientError::Transport(format!("unexpected stream response ({})", status))
            }));
        }

        Ok(decode_events(resp.bytes_stream()))
    }
}

/// Turn the raw body of the live stream into events. Unreadable frames are
/// logged and skipped; a read error is yielded once and ends the stream.
pub fn decode_events<S, E>(bytes: S) -> BoxStream<'static, Result<GatewayEvent, ClientError>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let events = async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::new();
        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e.into());
                    break;
                }
            };
            for frame in decoder.push(&chunk) {
                match serde_json::from_str::<GatewayEvent>(&frame.data) {
                    Ok(event) => yield Ok(event),
                    Err(e) => warn!("Ignoring unreadable {:?} event: {}", frame.event, e),
                }
            }
        }
        debug!("Live message stream ended");
    };
    events.boxed()
}

impl MessagingApi for HttpClient {
    async fn fetch_history(&self, token: &str, peer: Uuid) -> Result<Vec<Message>, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/message/get"))
            .bearer_auth(token)
            .json(&HistoryRequest { to_user_id: peer })
            .send()
            .await?;
        let body: HistoryResponse = decode(resp).await?;
        Ok(body.messages)
    }

    async fn send_message(
        &self,
        token: &str,
        peer: Uuid,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<Message, ClientError> {
        let mut form = multipart::Form::new()
            .text("to_user_id", peer.to_string())
            .text("text", text.to_string());
        if let Some(image) = image {
            let part = multipart::Part::bytes(image.bytes.to_vec())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)
                .map_err(|_| ClientError::Rejected(format!("Unsupported image type '{}'", image.content_type)))?;
            form = form.part("image", part);
        }

        let resp = self
            .client
            .post(self.url("/api/message/send"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        let body: SendMessageResponse = decode(resp).await?;
        Ok(body.message)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    decode_body(status, &body)
}

/// 2xx bodies that parse as `T` succeed. Anything carrying a `{ message }`
/// is the server refusing; the rest is a transport failure.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ClientError> {
    if status.is_success() {
        if let Ok(value) = serde_json::from_slice::<T>(body) {
            return Ok(value);
        }
    }
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(err) => Err(ClientError::Rejected(err.message)),
        Err(_) => Err(ClientError::Transport(format!("unexpected response ({})", status))),
    }
}
