use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The identity provider could not hand out a token.
    #[error("{0}")]
    Token(String),

    /// The server was reached and refused, with its own message.
    #[error("{0}")]
    Rejected(String),

    /// Network failure or an unreadable response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Text shown to the user. Transport details are replaced by `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Token(msg) | Self::Rejected(msg) => msg.clone(),
            Self::Transport(_) => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
