use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("transport setup failed: {0}")]
    Setup(String),

    #[error("option {name} rejected: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("protocol pump failed: {0}")]
    Pump(String),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
