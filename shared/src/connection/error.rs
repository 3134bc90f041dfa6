use thiserror::Error;

use super::connection_state::ConnectionState;

/// Errors that can occur while driving the connection state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The state machine does not allow this transition
    #[error("Connection cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}

/// Errors that can occur while encoding or decoding wire payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Payload is shorter than its fixed header
    #[error("Payload of {length} bytes is too short, at least {required} bytes are required")]
    PayloadTooShort { length: usize, required: usize },

    /// The event codec rejected an outgoing event
    #[error("Failed to encode event: {reason}")]
    Encode { reason: String },

    /// The event codec rejected incoming bytes
    #[error("Failed to decode event: {reason}")]
    Decode { reason: String },
}
