use tokio::sync::mpsc;
use tracing::warn;

/// User-visible, transient notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error(String),
}

/// One-way sink for notifications. Emitting never blocks and never fails,
/// even once the receiving UI is gone.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        let _ = self.tx.send(Notification::Error(message));
    }
}
