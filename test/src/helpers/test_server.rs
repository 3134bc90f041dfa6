use tessera_server::{IoEndpoint, PacketChannel, Server, ServerConfig, WorldEvents};
use tessera_shared::{
    ConnectionKey, EntityId, EventCodec, Position, WirePayload,
};

use crate::{protocol, TestCodec, TestEvent};

/// A payload the server handed to the network side, decoded
#[derive(Clone, Debug, PartialEq)]
pub struct Delivered {
    pub connection: ConnectionKey,
    pub nonce: u32,
    pub event: TestEvent,
}

/// A [`Server`] wired to in-process packet queues, with the client side
/// of the queues driven directly by the test
pub struct TestServer {
    pub server: Server<TestEvent>,
    pub endpoint: IoEndpoint,
    codec: TestCodec,
}

impl TestServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let mut server =
            Server::new(config, protocol(), TestCodec).expect("test config is valid");
        let (packet_sender, packet_receiver, endpoint) = PacketChannel::unbounded();
        server.io_load(packet_sender, packet_receiver);
        Self {
            server,
            endpoint,
            codec: TestCodec,
        }
    }

    /// Accepts and establishes a connection
    pub fn connect(&mut self) -> ConnectionKey {
        let connection = self.server.accept_connection();
        self.server
            .establish_connection(&connection)
            .expect("new connection can be established");
        connection
    }

    /// Connects and authenticates as `entity`
    pub fn connect_as(&mut self, entity: EntityId) -> ConnectionKey {
        let connection = self.connect();
        self.server
            .authenticate(&connection, entity)
            .expect("entity is not bound yet");
        connection
    }

    /// Spawns an entity with a staged position
    pub fn spawn_at(&mut self, position: Position) -> EntityId {
        let world = self.server.world_mut();
        let entity = world.spawn();
        world
            .add(&entity, position)
            .expect("fresh entity has no position");
        entity
    }

    pub fn move_to(&mut self, entity: &EntityId, position: Position) {
        self.server
            .world_mut()
            .update(entity, position)
            .expect("entity has a position");
    }

    /// Runs one full tick: receive, commit, send
    pub fn tick(&mut self) -> WorldEvents {
        self.server.receive_all_packets();
        let events = self.server.commit_tick().expect("tick commits");
        self.server.send_all_packets();
        events
    }

    /// Delivers an event as if `connection` had sent it
    pub fn client_send(&self, connection: ConnectionKey, nonce: u32, event: &TestEvent) {
        let bytes = self.codec.encode(event).expect("test events encode");
        let payload = WirePayload::new(nonce, bytes);
        self.client_send_raw(connection, &payload.to_bytes());
    }

    pub fn client_send_raw(&self, connection: ConnectionKey, bytes: &[u8]) {
        self.endpoint
            .deliver(connection, bytes)
            .expect("unbounded queue accepts packets");
    }

    /// Drains and decodes everything the server has sent
    pub fn delivered(&self) -> Vec<Delivered> {
        self.endpoint
            .take_outgoing()
            .into_iter()
            .map(|(connection, bytes)| {
                let payload = WirePayload::from_bytes(&bytes).expect("server sends valid payloads");
                Delivered {
                    connection,
                    nonce: payload.nonce,
                    event: self.codec.decode(&payload.event).expect("server sends valid events"),
                }
            })
            .collect()
    }

    /// Everything delivered to one connection, in delivery order
    pub fn delivered_to(&self, connection: ConnectionKey) -> Vec<Delivered> {
        self.delivered()
            .into_iter()
            .filter(|delivered| delivered.connection == connection)
            .collect()
    }
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}
