use std::future::Future;

use uuid::Uuid;

use sharezone_types::models::Message;

use crate::draft::ImageAttachment;
use crate::error::ClientError;

/// Hands out a bearer token for the signed-in user. Called before every request.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// The server's messaging endpoints.
pub trait MessagingApi: Send + Sync {
    /// Full history between the token's user and `peer`.
    fn fetch_history(
        &self,
        token: &str,
        peer: Uuid,
    ) -> impl Future<Output = Result<Vec<Message>, ClientError>> + Send;

    /// Deliver one message; returns the server's canonical record.
    fn send_message(
        &self,
        token: &str,
        peer: Uuid,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> impl Future<Output = Result<Message, ClientError>> + Send;
}
