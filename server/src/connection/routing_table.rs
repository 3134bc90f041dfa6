use std::collections::{BTreeSet, HashMap};

use log::{info, warn};

use tessera_shared::{
    ConnectionKey, ConnectionState, EntityId, EventKind, GridPosition, Role, RoleSet,
};

use crate::{connection::connection::Connection, TesseraServerError};

/// Why an inbound event was rejected as untrusted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustViolationKind {
    /// The connection has not authenticated as any entity
    Unauthenticated,
    /// The event names a source entity other than the authenticated one
    SpoofedSource { claimed: EntityId, bound: EntityId },
    /// The payload could not be decoded
    MalformedPayload,
}

/// A rejected inbound event, kept for the application to act upon
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrustViolation {
    pub connection: ConnectionKey,
    pub kind: Option<EventKind>,
    pub violation: TrustViolationKind,
}

/// Connection registry shared by the pipeline stages: connection state,
/// entity bindings, segment subscriptions and entity roles
pub struct RoutingTable {
    connections: HashMap<ConnectionKey, Connection>,
    entity_connections: HashMap<EntityId, ConnectionKey>,
    segment_subscribers: HashMap<GridPosition, BTreeSet<ConnectionKey>>,
    entity_roles: HashMap<EntityId, RoleSet>,
    trust_violations: Vec<TrustViolation>,
    next_key: u64,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            entity_connections: HashMap::new(),
            segment_subscribers: HashMap::new(),
            entity_roles: HashMap::new(),
            trust_violations: Vec::new(),
            next_key: 0,
        }
    }

    // Connections

    /// Registers a new connection and moves it to Connecting
    pub fn accept(&mut self) -> ConnectionKey {
        let key = ConnectionKey::from_u64(self.next_key);
        self.next_key = self.next_key.wrapping_add(1);

        let mut connection = Connection::new(key, fastrand::u32(..));
        connection.state = ConnectionState::Connecting;
        self.connections.insert(key, connection);
        info!("{} accepted", key);
        key
    }

    pub fn establish(&mut self, key: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.transition(key, ConnectionState::Connected)?;
        info!("{} established", key);
        Ok(())
    }

    /// Moves a Disconnected connection back to Connecting
    pub fn reconnect(&mut self, key: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.transition(key, ConnectionState::Connecting)?;
        info!("{} reconnecting", key);
        Ok(())
    }

    /// Marks a connection as errored. Its subscriptions and entity binding
    /// are dropped immediately so nothing more is routed to it.
    pub fn fail(&mut self, key: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.transition(key, ConnectionState::Failed)?;
        self.clear_session(key);
        warn!("{} failed", key);
        Ok(())
    }

    /// Failed connections must be reset before they can reconnect
    pub fn reset(&mut self, key: &ConnectionKey) -> Result<(), TesseraServerError> {
        let state = self.state(key)?;
        if state != ConnectionState::Failed {
            return Err(TesseraServerError::ConnectionNotActive {
                connection: *key,
                state,
                operation: "be reset",
            });
        }
        self.transition(key, ConnectionState::Disconnected)?;
        info!("{} reset", key);
        Ok(())
    }

    /// Graceful teardown. The record is removed.
    pub fn disconnect(&mut self, key: &ConnectionKey) -> Result<(), TesseraServerError> {
        let state = self.state(key)?;
        if state != ConnectionState::Disconnected {
            self.transition(key, ConnectionState::Disconnected)?;
        }
        self.clear_session(key);
        self.connections.remove(key);
        info!("{} disconnected", key);
        Ok(())
    }

    pub fn state(&self, key: &ConnectionKey) -> Result<ConnectionState, TesseraServerError> {
        self.connections
            .get(key)
            .map(Connection::state)
            .ok_or(TesseraServerError::ConnectionNotFound { connection: *key })
    }

    pub fn connection(&self, key: &ConnectionKey) -> Option<&Connection> {
        self.connections.get(key)
    }

    pub fn connection_keys(&self) -> Vec<ConnectionKey> {
        let mut keys: Vec<ConnectionKey> = self.connections.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_routable(&self, key: &ConnectionKey) -> bool {
        self.connections
            .get(key)
            .is_some_and(|connection| connection.state().is_routable())
    }

    /// Nonce for the next payload sent to this connection
    pub(crate) fn next_nonce(&mut self, key: &ConnectionKey) -> Option<u32> {
        self.connections.get_mut(key).map(Connection::next_nonce)
    }

    // Authentication

    /// Binds a live connection to the entity it acts for
    pub fn authenticate(
        &mut self,
        key: &ConnectionKey,
        entity: EntityId,
    ) -> Result<(), TesseraServerError> {
        let connection = self.live_connection(key, "authenticate")?;
        if let Some(bound) = connection.entity() {
            return Err(TesseraServerError::AlreadyAuthenticated {
                connection: *key,
                entity: bound,
            });
        }
        if let Some(other) = self.entity_connections.get(&entity) {
            return Err(TesseraServerError::EntityAlreadyBound {
                entity,
                connection: *other,
            });
        }

        if let Some(connection) = self.connections.get_mut(key) {
            connection.entity = Some(entity);
        }
        self.entity_connections.insert(entity, *key);
        info!("{} authenticated as {}", key, entity);
        Ok(())
    }

    pub fn authenticated_entity(&self, key: &ConnectionKey) -> Option<EntityId> {
        self.connections.get(key).and_then(Connection::entity)
    }

    /// The connection bound to this entity, if it can be routed to
    pub fn connection_for_entity(&self, entity: &EntityId) -> Option<ConnectionKey> {
        let key = self.entity_connections.get(entity)?;
        self.is_routable(key).then_some(*key)
    }

    // Subscriptions

    /// Returns false if the connection was already subscribed
    pub fn subscribe(
        &mut self,
        key: &ConnectionKey,
        segment: GridPosition,
    ) -> Result<bool, TesseraServerError> {
        self.live_connection(key, "subscribe")?;
        let Some(connection) = self.connections.get_mut(key) else {
            return Err(TesseraServerError::ConnectionNotFound { connection: *key });
        };
        if !connection.subscriptions.insert(segment) {
            return Ok(false);
        }
        self.segment_subscribers
            .entry(segment)
            .or_default()
            .insert(*key);
        Ok(true)
    }

    /// Returns false if the connection was not subscribed
    pub fn unsubscribe(
        &mut self,
        key: &ConnectionKey,
        segment: &GridPosition,
    ) -> Result<bool, TesseraServerError> {
        let Some(connection) = self.connections.get_mut(key) else {
            return Err(TesseraServerError::ConnectionNotFound { connection: *key });
        };
        if !connection.subscriptions.remove(segment) {
            return Ok(false);
        }
        self.remove_subscriber(segment, key);
        Ok(true)
    }

    /// Routable connections subscribed to a segment, in key order
    pub fn subscribers_of(&self, segment: &GridPosition) -> Vec<ConnectionKey> {
        let Some(subscribers) = self.segment_subscribers.get(segment) else {
            return Vec::new();
        };
        subscribers
            .iter()
            .filter(|key| self.is_routable(key))
            .copied()
            .collect()
    }

    // Roles

    /// Returns false if the entity already held the role
    pub fn grant_role(&mut self, entity: EntityId, role: Role) -> bool {
        self.entity_roles.entry(entity).or_default().grant(role)
    }

    /// Returns false if the entity did not hold the role
    pub fn revoke_role(&mut self, entity: &EntityId, role: &Role) -> bool {
        let Some(roles) = self.entity_roles.get_mut(entity) else {
            return false;
        };
        let revoked = roles.revoke(role);
        if roles.is_empty() {
            self.entity_roles.remove(entity);
        }
        revoked
    }

    pub fn has_role(&self, entity: &EntityId, role: &Role) -> bool {
        self.entity_roles
            .get(entity)
            .is_some_and(|roles| roles.has(role))
    }

    // Trust violations

    pub fn record_violation(&mut self, violation: TrustViolation) {
        warn!(
            "Rejected inbound event from {}: {:?}",
            violation.connection, violation.violation
        );
        self.trust_violations.push(violation);
    }

    pub fn take_trust_violations(&mut self) -> Vec<TrustViolation> {
        std::mem::take(&mut self.trust_violations)
    }

    // Private

    fn transition(
        &mut self,
        key: &ConnectionKey,
        next: ConnectionState,
    ) -> Result<(), TesseraServerError> {
        let Some(connection) = self.connections.get_mut(key) else {
            return Err(TesseraServerError::ConnectionNotFound { connection: *key });
        };
        connection.state = connection.state.transition(next)?;
        Ok(())
    }

    /// Connecting or Connected
    fn live_connection(
        &self,
        key: &ConnectionKey,
        operation: &'static str,
    ) -> Result<&Connection, TesseraServerError> {
        let Some(connection) = self.connections.get(key) else {
            return Err(TesseraServerError::ConnectionNotFound { connection: *key });
        };
        match connection.state() {
            ConnectionState::Connecting | ConnectionState::Connected => Ok(connection),
            state => Err(TesseraServerError::ConnectionNotActive {
                connection: *key,
                state,
                operation,
            }),
        }
    }

    fn clear_session(&mut self, key: &ConnectionKey) {
        let Some(connection) = self.connections.get_mut(key) else {
            return;
        };
        let segments: Vec<GridPosition> = connection.subscriptions.drain().collect();
        if let Some(entity) = connection.entity.take() {
            self.entity_connections.remove(&entity);
        }
        for segment in segments {
            self.remove_subscriber(&segment, key);
        }
    }

    fn remove_subscriber(&mut self, segment: &GridPosition, key: &ConnectionKey) {
        if let Some(subscribers) = self.segment_subscribers.get_mut(segment) {
            subscribers.remove(key);
            if subscribers.is_empty() {
                self.segment_subscribers.remove(segment);
            }
        }
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}
