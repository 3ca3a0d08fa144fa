//! Error types for the NAD control protocol.

use thiserror::Error;

/// Protocol-level errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command violates the variable/operator/value invariant.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Reply contains no recognizable operator character.
    #[error("Unparseable reply: {0:?}")]
    UnparseableReply(String),

    /// String is not a known operator character.
    #[error("Unknown operator: {0:?}")]
    UnknownOperator(char),

    /// String is not a member of the source enumeration.
    #[error("Unknown source: {0:?}")]
    UnknownSource(String),
}
