use std::sync::Arc;

use tracing::{debug, info};

use sharezone_types::models::Message;

use crate::api::{MessagingApi, TokenProvider};
use crate::conversation::ConversationHandle;
use crate::error::ClientError;
use crate::notify::Notifier;

#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing to send, or no conversation open. No request was made.
    Skipped,
    /// Server accepted the message.
    Sent(Message),
    /// Failure was reported through the notifier; the draft is untouched.
    Failed(ClientError),
}

/// Sends the open conversation's draft. One request per call, no retries.
pub struct SendPipeline<A, T> {
    api: Arc<A>,
    tokens: Arc<T>,
    conversation: ConversationHandle,
    notifier: Notifier,
}

impl<A: MessagingApi, T: TokenProvider> SendPipeline<A, T> {
    pub fn new(api: Arc<A>, tokens: Arc<T>, conversation: ConversationHandle, notifier: Notifier) -> Self {
        Self {
            api,
            tokens,
            conversation,
            notifier,
        }
    }

    pub async fn send(&self) -> SendOutcome {
        let (peer, generation, draft) = {
            let conversation = self.conversation.read().await;
            let Some(peer) = conversation.peer else {
                return SendOutcome::Skipped;
            };
            if conversation.draft.is_empty() {
                return SendOutcome::Skipped;
            }
            (peer, conversation.generation, conversation.draft.clone())
        };

        let result = async {
            let token = self.tokens.token().await?;
            self.api
                .send_message(&token, peer, &draft.text, draft.image.as_ref())
                .await
        }
        .await;

        match result {
            Ok(message) => {
                let mut conversation = self.conversation.write().await;
                if conversation.generation == generation {
                    conversation.store.append(message.clone());
                    conversation.draft.clear();
                } else {
                    // Conversation changed while the request was in flight
                    debug!("Sent message {} belongs to a closed conversation", message.id);
                }
                info!("Sent message {} to {}", message.id, peer);
                SendOutcome::Sent(message)
            }
            Err(e) => {
                self.notifier.error(e.user_message("Failed to send message"));
                SendOutcome::Failed(e)
            }
        }
    }
}
