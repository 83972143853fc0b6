//! Error types for the viewer bridge

use thiserror::Error;

use crate::session::SessionState;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The viewer has not signalled readiness, or the session is errored and
    /// needs a reload first.
    #[error("viewer cannot receive data in state {state}")]
    NotReady { state: SessionState },

    /// Every artifact in the batch was dropped by preview deduplication.
    #[error("no renderable artifacts to send")]
    NothingToSend,

    /// All delivery attempts were exhausted.
    #[error("delivery failed after {attempts} attempts")]
    SendFailed { attempts: u32 },

    #[error("channel failure: {0}")]
    Channel(#[from] ChannelError),

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures of the underlying delivery channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,

    #[error("transport failure: {0}")]
    Transport(String),
}
