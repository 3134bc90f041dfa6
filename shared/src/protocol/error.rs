use thiserror::Error;

use crate::EventKind;

/// Errors that can occur while building a Protocol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified. Protocol.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// The event kind was registered twice
    #[error("{kind} is already registered")]
    DuplicateEventKind { kind: EventKind },

    /// Two event kinds were registered under the same name
    #[error("An event named '{name}' is already registered")]
    DuplicateEventName { name: String },

    /// An allow-list or role requirement names an unregistered kind
    #[error("{kind} has not been registered")]
    UnknownEventKind { kind: EventKind },
}
