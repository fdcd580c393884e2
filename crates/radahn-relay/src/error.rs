use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("frame source closed")]
    Closed,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid relay configuration: {0}")]
    InvalidConfig(String),
}

impl From<zeromq::ZmqError> for RelayError {
    fn from(e: zeromq::ZmqError) -> Self {
        RelayError::Transport(e.to_string())
    }
}
