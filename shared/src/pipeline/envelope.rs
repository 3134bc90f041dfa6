use crate::{ConnectionKey, EntityId};

/// An outbound event plus its routing. `destination` stays `None` until a
/// stage has resolved where the event goes.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundEnvelope<M> {
    pub event: M,
    pub destination: Option<ConnectionKey>,
}

impl<M> OutboundEnvelope<M> {
    pub fn new(event: M) -> Self {
        Self {
            event,
            destination: None,
        }
    }

    pub fn routed(event: M, destination: ConnectionKey) -> Self {
        Self {
            event,
            destination: Some(destination),
        }
    }

    pub fn is_routable(&self) -> bool {
        self.destination.is_some()
    }
}

/// An event decoded from the wire. `source` is filled in by the
/// source-entity stage from the connection's authenticated entity.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundEnvelope<M> {
    pub connection: ConnectionKey,
    pub nonce: u32,
    pub event: M,
    pub source: Option<EntityId>,
}

impl<M> InboundEnvelope<M> {
    pub fn new(connection: ConnectionKey, nonce: u32, event: M) -> Self {
        Self {
            connection,
            nonce,
            event,
            source: None,
        }
    }
}
