use std::collections::HashSet;

use tessera_shared::{ConnectionKey, ConnectionState, EntityId, GridPosition};

/// Server-side record of one remote peer
#[derive(Clone, Debug)]
pub struct Connection {
    key: ConnectionKey,
    pub(crate) state: ConnectionState,
    pub(crate) entity: Option<EntityId>,
    pub(crate) subscriptions: HashSet<GridPosition>,
    next_nonce: u32,
}

impl Connection {
    pub(crate) fn new(key: ConnectionKey, first_nonce: u32) -> Self {
        Self {
            key,
            state: ConnectionState::Disconnected,
            entity: None,
            subscriptions: HashSet::new(),
            next_nonce: first_nonce,
        }
    }

    pub fn key(&self) -> ConnectionKey {
        self.key
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The entity this peer authenticated as
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &GridPosition> {
        self.subscriptions.iter()
    }

    pub fn is_subscribed(&self, segment: &GridPosition) -> bool {
        self.subscriptions.contains(segment)
    }

    pub(crate) fn next_nonce(&mut self) -> u32 {
        let nonce = self.next_nonce;
        self.next_nonce = self.next_nonce.wrapping_add(1);
        nonce
    }
}
