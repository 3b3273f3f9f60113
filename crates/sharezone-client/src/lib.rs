//! Client-side direct messaging: the per-conversation message store, the
//! history sync controller, the send pipeline and the render model, plus an
//! HTTP implementation of the server contract.

pub mod api;
pub mod conversation;
pub mod directory;
pub mod draft;
pub mod error;
pub mod http;
pub mod notify;
pub mod send;
pub mod sse;
pub mod store;
pub mod sync;
pub mod view;

#[cfg(test)]
mod testing;

pub use conversation::{Conversation, ConversationHandle, Phase};
pub use error::ClientError;
pub use notify::{Notification, Notifier};
pub use send::{SendOutcome, SendPipeline};
pub use sync::{ConversationSync, FetchTicket};
pub use view::{Alignment, ConversationView, RenderedConversation};
