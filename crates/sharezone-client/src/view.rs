use std::sync::Arc;

use uuid::Uuid;

use sharezone_types::models::{Message, Profile};

use crate::conversation::ConversationHandle;
use crate::directory::ConnectionsDirectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Sent by the viewer.
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub message: Message,
    pub alignment: Alignment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedConversation {
    pub peer: Profile,
    pub rows: Vec<RenderedMessage>,
    /// Newest message to scroll to. Set only when the list changed since the
    /// previous render.
    pub scroll_to: Option<Uuid>,
}

/// Order messages for display and tag their side.
///
/// Sorted by `created_at`; the sort is stable, so equal timestamps keep
/// arrival order. A message addressed to the peer is outgoing, whoever
/// its sender is.
pub fn arrange(messages: &[Message], peer_id: Uuid) -> Vec<RenderedMessage> {
    let mut sorted = messages.to_vec();
    sorted.sort_by_key(|m| m.created_at);
    sorted
        .into_iter()
        .map(|message| {
            let alignment = if message.to_user_id == peer_id {
                Alignment::Outgoing
            } else {
                Alignment::Incoming
            };
            RenderedMessage { message, alignment }
        })
        .collect()
}

/// Render model over the open conversation.
pub struct ConversationView<D> {
    conversation: ConversationHandle,
    directory: Arc<D>,
    rendered: Option<(u64, u64)>,
}

impl<D: ConnectionsDirectory> ConversationView<D> {
    pub fn new(conversation: ConversationHandle, directory: Arc<D>) -> Self {
        Self {
            conversation,
            directory,
            rendered: None,
        }
    }

    /// `None` until a conversation is open and its peer's profile is known.
    pub async fn render(&mut self) -> Option<RenderedConversation> {
        let conversation = self.conversation.read().await;
        let peer_id = conversation.peer?;
        let peer = self.directory.profile(peer_id)?;

        let rows = arrange(conversation.store.messages(), peer_id);

        let key = (conversation.generation, conversation.store.revision());
        let scroll_to = if self.rendered != Some(key) {
            self.rendered = Some(key);
            rows.last().map(|r| r.message.id)
        } else {
            None
        };

        Some(RenderedConversation {
            peer,
            rows,
            scroll_to,
        })
    }
}
