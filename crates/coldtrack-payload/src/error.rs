use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("encoded message is {len} bytes, exceeds the {max}-byte uplink bound")]
    Overflow { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, PayloadError>;
