use std::fmt;

use crate::{ConnectionKey, EntityId, GridPosition};

/// Identifies a type of replicated event. Kinds are registered on the
/// [`Protocol`](crate::Protocol) together with a unique name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(u16);

impl EventKind {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKind({})", self.0)
    }
}

/// Who an outbound event is about, which decides where it is routed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventScope {
    /// Delivered to the connection bound to this entity
    Entity(EntityId),
    /// Delivered to every connection subscribed to this segment
    Segment(GridPosition),
    /// Delivered to exactly this connection
    Connection(ConnectionKey),
}

/// An event that can travel through the replication pipeline
pub trait Event: Send + Sync + 'static {
    fn kind(&self) -> EventKind;

    fn scope(&self) -> EventScope;

    /// The source entity an inbound event claims to come from, if it names one
    fn claimed_source(&self) -> Option<EntityId> {
        None
    }
}
