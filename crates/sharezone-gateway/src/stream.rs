use axum::{
    Extension,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::Stream;
use tracing::{debug, info};
use uuid::Uuid;

use sharezone_types::api::Principal;
use sharezone_types::events::GatewayEvent;

use crate::dispatcher::Dispatcher;

/// GET /api/message/stream — Server-Sent Events carrying every message
/// addressed to the authenticated user, starting with a `ready` event.
pub async fn message_stream(
    State(dispatcher): State<Dispatcher>,
    Extension(principal): Extension<Principal>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let user_id = principal.user_id;
    let (conn_id, mut rx) = dispatcher.register_user_channel(user_id).await;
    info!("{} opened live message stream", user_id);

    let guard = StreamGuard {
        dispatcher,
        user_id,
        conn_id,
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        yield to_sse(&GatewayEvent::Ready { user_id });
        while let Some(event) = rx.recv().await {
            yield to_sse(&event);
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn to_sse(event: &GatewayEvent) -> Result<Event, axum::Error> {
    Event::default().event(event.name()).json_data(event)
}

/// Unregisters the user's channel once the client goes away.
struct StreamGuard {
    dispatcher: Dispatcher,
    user_id: Uuid,
    conn_id: Uuid,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let dispatcher = self.dispatcher.clone();
        let (user_id, conn_id) = (self.user_id, self.conn_id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                dispatcher.unregister_user_channel(user_id, conn_id).await;
                debug!("{} closed live message stream", user_id);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sharezone_types::models::{Message, MessageType};

    #[test]
    fn message_event_is_named_and_json_encoded() {
        let message = Message {
            id: Uuid::nil(),
            from_user_id: Uuid::new_v4(),
            to_user_id: Uuid::new_v4(),
            text: "hi".into(),
            message_type: MessageType::Text,
            media_url: None,
            created_at: Utc::now(),
        };
        assert!(to_sse(&GatewayEvent::MessageCreate(message)).is_ok());
    }
}
