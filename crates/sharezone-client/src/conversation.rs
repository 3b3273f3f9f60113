use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::draft::Draft;
use crate::store::MessageStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// State of the conversation view: which peer is open, its messages and the
/// unsent draft.
///
/// `generation` changes on every open and close; async work captures it up
/// front and drops its result if it no longer matches.
#[derive(Debug, Default)]
pub struct Conversation {
    pub peer: Option<Uuid>,
    pub phase: Phase,
    pub generation: u64,
    pub store: MessageStore,
    pub draft: Draft,
}

impl Conversation {
    /// Switch to `peer` (or to nothing), dropping everything that belonged to
    /// the previous conversation.
    pub(crate) fn reset(&mut self, peer: Option<Uuid>, phase: Phase) -> u64 {
        self.generation += 1;
        self.peer = peer;
        self.phase = phase;
        self.store.clear();
        self.draft.clear();
        self.generation
    }
}

/// Shared handle to the one [`Conversation`]. The sync controller writes it;
/// the send pipeline and the view hold clones.
#[derive(Debug, Clone, Default)]
pub struct ConversationHandle {
    inner: Arc<RwLock<Conversation>>,
}

impl ConversationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Conversation> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Conversation> {
        self.inner.write().await
    }

    /// Replace the draft text, as typed by the user.
    pub async fn set_text(&self, text: impl Into<String>) {
        self.inner.write().await.draft.text = text.into();
    }

    pub async fn set_image(&self, image: Option<crate::draft::ImageAttachment>) {
        self.inner.write().await.draft.image = image;
    }
}
