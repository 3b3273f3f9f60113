use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use sharezone_types::models::{Message, MessageType, Profile};

use crate::api::{MessagingApi, TokenProvider};
use crate::draft::ImageAttachment;
use crate::error::ClientError;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn text_message(from: Uuid, to: Uuid, text: &str, secs: i64) -> Message {
    Message {
        id: Uuid::new_v4(),
        from_user_id: from,
        to_user_id: to,
        text: text.into(),
        message_type: MessageType::Text,
        media_url: None,
        created_at: at(secs),
    }
}

pub fn profile(username: &str) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        full_name: username.to_uppercase(),
        username: username.into(),
        profile_picture: None,
    }
}

/// How the fake server answers the next send.
#[derive(Debug, Clone)]
pub enum SendReply {
    Accept,
    Reject(String),
    Unreachable,
}

/// In-memory stand-in for the server, counting every call.
pub struct FakeApi {
    pub me: Uuid,
    history: Mutex<HashMap<Uuid, Result<Vec<Message>, String>>>,
    holds: Mutex<HashMap<Uuid, Arc<Notify>>>,
    send_reply: Mutex<SendReply>,
    send_hold: Mutex<Option<Arc<Notify>>>,
    pub history_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub last_sent: Mutex<Option<(Uuid, String, Option<ImageAttachment>)>>,
}

impl FakeApi {
    pub fn new(me: Uuid) -> Arc<Self> {
        Arc::new(Self {
            me,
            history: Mutex::new(HashMap::new()),
            holds: Mutex::new(HashMap::new()),
            send_reply: Mutex::new(SendReply::Accept),
            send_hold: Mutex::new(None),
            history_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            last_sent: Mutex::new(None),
        })
    }

    pub fn set_history(&self, peer: Uuid, messages: Vec<Message>) {
        self.history.lock().unwrap().insert(peer, Ok(messages));
    }

    pub fn fail_history(&self, peer: Uuid, message: &str) {
        self.history.lock().unwrap().insert(peer, Err(message.into()));
    }

    /// Make history fetches for `peer` wait until the returned handle is notified.
    pub fn hold_history(&self, peer: Uuid) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds.lock().unwrap().insert(peer, notify.clone());
        notify
    }

    /// Make sends wait until the returned handle is notified.
    pub fn hold_send(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.send_hold.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn reply_with(&self, reply: SendReply) {
        *self.send_reply.lock().unwrap() = reply;
    }
}

impl MessagingApi for FakeApi {
    async fn fetch_history(&self, _token: &str, peer: Uuid) -> Result<Vec<Message>, ClientError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let hold = self.holds.lock().unwrap().get(&peer).cloned();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        match self.history.lock().unwrap().get(&peer).cloned() {
            Some(Ok(messages)) => Ok(messages),
            Some(Err(message)) => Err(ClientError::Rejected(message)),
            None => Ok(vec![]),
        }
    }

    async fn send_message(
        &self,
        _token: &str,
        peer: Uuid,
        text: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<Message, ClientError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sent.lock().unwrap() = Some((peer, text.to_string(), image.cloned()));

        let hold = self.send_hold.lock().unwrap().clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }

        let reply = self.send_reply.lock().unwrap().clone();
        match reply {
            SendReply::Accept => Ok(Message {
                id: Uuid::new_v4(),
                from_user_id: self.me,
                to_user_id: peer,
                text: text.to_string(),
                message_type: if image.is_some() { MessageType::Image } else { MessageType::Text },
                media_url: image.map(|i| format!("http://localhost:4000/uploads/{}", i.file_name)),
                created_at: Utc::now(),
            }),
            SendReply::Reject(message) => Err(ClientError::Rejected(message)),
            SendReply::Unreachable => Err(ClientError::Transport("connection refused".into())),
        }
    }
}

#[derive(Default)]
pub struct FakeTokens {
    pub expired: AtomicBool,
}

impl TokenProvider for FakeTokens {
    async fn token(&self) -> Result<String, ClientError> {
        if self.expired.load(Ordering::SeqCst) {
            return Err(ClientError::Token("Session expired".into()));
        }
        Ok("token".into())
    }
}
