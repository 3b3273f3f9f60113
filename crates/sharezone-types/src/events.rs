use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Events pushed to a user's live message stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Stream is open for this user
    Ready { user_id: Uuid },

    /// A message addressed to the stream's owner was persisted
    MessageCreate(Message),
}

impl GatewayEvent {
    /// SSE event name for this variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::MessageCreate(_) => "message",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_event_is_tagged() {
        let id = Uuid::nil();
        let json = serde_json::to_value(GatewayEvent::Ready { user_id: id }).unwrap();
        assert_eq!(json["type"], "Ready");
        assert_eq!(json["data"]["user_id"], id.to_string());
    }
}
