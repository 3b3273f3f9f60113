use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sharezone_types::events::GatewayEvent;
use sharezone_types::models::Message;

use crate::api::{MessagingApi, TokenProvider};
use crate::conversation::{ConversationHandle, Phase};
use crate::error::ClientError;
use crate::notify::Notifier;

/// Identifies one history fetch: the peer it was issued for and the
/// conversation generation at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub peer: Uuid,
    pub generation: u64,
}

/// Drives the open conversation: Idle -> Loading -> Ready, and back to Idle
/// on close or peer switch.
///
/// A fetch whose generation is no longer current when it completes is
/// discarded, so a slow response for a previous peer never lands in the
/// store of the next one.
pub struct ConversationSync<A, T> {
    api: Arc<A>,
    tokens: Arc<T>,
    conversation: ConversationHandle,
    notifier: Notifier,
}

impl<A: MessagingApi, T: TokenProvider> ConversationSync<A, T> {
    pub fn new(api: Arc<A>, tokens: Arc<T>, conversation: ConversationHandle, notifier: Notifier) -> Self {
        Self {
            api,
            tokens,
            conversation,
            notifier,
        }
    }

    pub fn conversation(&self) -> &ConversationHandle {
        &self.conversation
    }

    /// Open the conversation with `peer` and load its history.
    pub async fn open(&self, peer: Uuid) {
        let ticket = self.begin_open(peer).await;
        let result = self.fetch_history(ticket).await;
        self.complete(ticket, result).await;
    }

    /// Clear the previous conversation and enter Loading for `peer`.
    pub async fn begin_open(&self, peer: Uuid) -> FetchTicket {
        let generation = self.conversation.write().await.reset(Some(peer), Phase::Loading);
        info!("Opening conversation with {} (generation {})", peer, generation);
        FetchTicket { peer, generation }
    }

    pub async fn fetch_history(&self, ticket: FetchTicket) -> Result<Vec<Message>, ClientError> {
        let token = self.tokens.token().await?;
        self.api.fetch_history(&token, ticket.peer).await
    }

    /// Apply a finished fetch. Returns false if the ticket was stale and the
    /// result was dropped.
    pub async fn complete(&self, ticket: FetchTicket, result: Result<Vec<Message>, ClientError>) -> bool {
        let mut conversation = self.conversation.write().await;
        if conversation.generation != ticket.generation {
            debug!(
                "Discarding history for {} (generation {}, now {})",
                ticket.peer, ticket.generation, conversation.generation
            );
            return false;
        }

        match result {
            Ok(mut messages) => {
                debug!("Loaded {} messages with {}", messages.len(), ticket.peer);
                // Anything received or sent while loading that the server
                // snapshot predates stays, after the history
                let arrived: Vec<Message> = conversation
                    .store
                    .messages()
                    .iter()
                    .filter(|m| !messages.iter().any(|h| h.id == m.id))
                    .cloned()
                    .collect();
                messages.extend(arrived);
                conversation.store.replace_all(messages);
            }
            Err(e) => self.notifier.error(e.user_message("Failed to load messages")),
        }
        conversation.phase = Phase::Ready;
        true
    }

    /// Close the view: drop its messages and draft, back to Idle.
    pub async fn close(&self) {
        let mut conversation = self.conversation.write().await;
        if let Some(peer) = conversation.peer {
            info!("Closing conversation with {}", peer);
        }
        conversation.reset(None, Phase::Idle);
    }

    /// A message arrived from outside (live stream). Appended only if it
    /// belongs to the open conversation and is not already present.
    pub async fn receive(&self, message: Message) -> bool {
        if !message.has_content() {
            warn!("Ignoring live message {} with neither text nor image", message.id);
            return false;
        }
        let mut conversation = self.conversation.write().await;
        let Some(peer) = conversation.peer else {
            return false;
        };
        if !message.involves(peer) || conversation.store.contains(message.id) {
            return false;
        }
        conversation.store.append(message);
        true
    }

    /// Feed live events into the open conversation until the stream ends.
    /// A stream error is reported once and ends the loop.
    pub async fn follow<S>(&self, events: S)
    where
        S: Stream<Item = Result<GatewayEvent, ClientError>>,
    {
        let mut events = std::pin::pin!(events);
        while let Some(event) = events.next().await {
            match event {
                Ok(GatewayEvent::MessageCreate(message)) => {
                    self.receive(message).await;
                }
                Ok(GatewayEvent::Ready { user_id }) => debug!("Live stream ready for {}", user_id),
                Err(e) => {
                    self.notifier.error(e.user_message("Lost connection to live messages"));
                    return;
                }
            }
        }
    }
}
