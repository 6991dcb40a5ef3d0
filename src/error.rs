//! Error types for redwire
//!
//! Provides a unified error type for all client operations.

use std::fmt;

use thiserror::Error;

/// Result type alias using WireError
pub type Result<T> = std::result::Result<T, WireError>;

/// Why an argument was refused by the chosen encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryArgumentReason {
    /// Inline encoding: every argument travels on one text line
    NoneMayBeBinary,

    /// Bulk encoding: only the final argument is length-prefixed
    OnlyLastMayBeBinary,

    /// Reserved for encodings that length-prefix some, but not all, leading arguments
    ArgumentMayNotBeBinary,
}

impl fmt::Display for BinaryArgumentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NoneMayBeBinary => {
                "none of the arguments are allowed to be binary, use send_bulk or send_multi_bulk instead"
            }
            Self::OnlyLastMayBeBinary => {
                "only the last argument is allowed to be binary, use send_multi_bulk instead"
            }
            Self::ArgumentMayNotBeBinary => {
                "argument is not allowed to be binary, use send_multi_bulk instead"
            }
        };
        f.write_str(msg)
    }
}

/// Unified error type for redwire operations
#[derive(Debug, Error)]
pub enum WireError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Argument type error at position(s) {positions:?}: {reason}")]
    ArgumentType {
        reason: BinaryArgumentReason,
        positions: Vec<usize>,
    },

    // -------------------------------------------------------------------------
    // Connection Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Reply Errors
    // -------------------------------------------------------------------------
    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),
}

impl WireError {
    /// Whether the connection can no longer be trusted after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WireError::Io(_) | WireError::Connection(_) | WireError::Protocol(_)
        )
    }
}
