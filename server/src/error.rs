use thiserror::Error;

use tessera_shared::{
    ComponentError, ConnectionError, ConnectionKey, ConnectionState, EntityId, EventKind,
    ProtocolError, SegmentError,
};

use crate::{events::IndexerKey, transport::TransportError};

/// Errors raised by the tessera server
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TesseraServerError {
    /// `ServerConfig::tick_interval` must be non-zero
    #[error("Tick interval must be greater than zero")]
    InvalidTickInterval,

    /// Movement delay must be at least one tick and less than half the tick range
    #[error("Movement delay of {delay} ticks is invalid, it must be between 1 and {max}")]
    InvalidMovementDelay { delay: u16, max: u16 },

    /// Stale tolerance may not exceed the longest movement delay
    #[error("Movement stale tolerance of {tolerance} ticks is invalid, it must be at most {max}")]
    InvalidStaleTolerance { tolerance: u16, max: u16 },

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No connection record exists for this key
    #[error("{connection} does not exist")]
    ConnectionNotFound { connection: ConnectionKey },

    /// The operation needs a connection in a live state
    #[error("{connection} is {state:?} and cannot {operation}")]
    ConnectionNotActive {
        connection: ConnectionKey,
        state: ConnectionState,
        operation: &'static str,
    },

    /// A connection is bound to at most one entity
    #[error("{connection} is already authenticated as {entity}")]
    AlreadyAuthenticated {
        connection: ConnectionKey,
        entity: EntityId,
    },

    /// An entity is bound to at most one connection
    #[error("{entity} is already bound to {connection}")]
    EntityAlreadyBound {
        entity: EntityId,
        connection: ConnectionKey,
    },

    #[error("No segment indexer registered as {key:?}")]
    IndexerNotFound { key: IndexerKey },

    /// Handler names must be unique within a registry
    #[error("A handler named '{name}' is already registered")]
    DuplicateHandlerName { name: String },

    /// Only one handler may be registered per event kind
    #[error("A handler for {kind} is already registered")]
    DuplicateHandlerKind { kind: EventKind },
}
