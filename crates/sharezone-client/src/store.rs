use sharezone_types::models::Message;

/// Messages of the conversation currently open, in arrival order.
/// Display order is decided by the view.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    revision: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.revision += 1;
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.revision += 1;
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn contains(&self, id: uuid::Uuid) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
