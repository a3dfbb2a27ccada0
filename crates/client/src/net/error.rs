use std::time::Duration;

use llmeta::ConfigError;
use tokio_tungstenite::tungstenite;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("unsupported endpoint scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("connection failed: {0}")]
    Connect(#[source] Box<tungstenite::Error>),
    #[error("join rejected: {0}")]
    JoinRejected(String),
    #[error("no join reply within {0:?}")]
    JoinTimeout(Duration),
    #[error("socket closed before join")]
    ClosedBeforeJoin,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<tungstenite::Error> for SessionError {
    fn from(err: tungstenite::Error) -> Self {
        SessionError::Connect(Box::new(err))
    }
}
