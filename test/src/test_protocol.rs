use tessera_server::MovementUpdate;
use tessera_shared::{
    ConnectionKey, EntityId, Event, EventCodec, EventKind, EventScope, GridPosition, HostType,
    Protocol, Role, WireError,
};

pub const MOVEMENT: EventKind = EventKind::new(1);
pub const CHAT: EventKind = EventKind::new(2);
pub const ADMIN_COMMAND: EventKind = EventKind::new(3);
pub const WHISPER: EventKind = EventKind::new(4);

pub const ADMIN: Role = Role::new(1);

/// Category tag component used to build filtered indexers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tag;

/// Event type used throughout the tests
#[derive(Clone, Debug, PartialEq)]
pub struct TestEvent {
    pub kind: EventKind,
    pub scope: EventScope,
    pub source: Option<EntityId>,
    pub body: Vec<u8>,
}

impl TestEvent {
    pub fn new(kind: EventKind, scope: EventScope, body: &[u8]) -> Self {
        Self {
            kind,
            scope,
            source: None,
            body: body.to_vec(),
        }
    }

    pub fn to_entity(kind: EventKind, entity: EntityId, body: &[u8]) -> Self {
        Self::new(kind, EventScope::Entity(entity), body)
    }

    pub fn to_segment(kind: EventKind, segment: GridPosition, body: &[u8]) -> Self {
        Self::new(kind, EventScope::Segment(segment), body)
    }

    pub fn to_connection(kind: EventKind, connection: ConnectionKey, body: &[u8]) -> Self {
        Self::new(kind, EventScope::Connection(connection), body)
    }

    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }
}

impl Event for TestEvent {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn scope(&self) -> EventScope {
        self.scope
    }

    fn claimed_source(&self) -> Option<EntityId> {
        self.source
    }
}

impl From<MovementUpdate> for TestEvent {
    fn from(update: MovementUpdate) -> Self {
        let mut body = Vec::with_capacity(24);
        body.extend_from_slice(&update.position.x.to_be_bytes());
        body.extend_from_slice(&update.position.y.to_be_bytes());
        body.extend_from_slice(&update.position.z.to_be_bytes());
        Self {
            kind: MOVEMENT,
            scope: EventScope::Segment(update.segment),
            source: Some(update.entity),
            body,
        }
    }
}

/// Protocol used by the tests: the server sends movement, chat and
/// whispers, and accepts chat and admin commands. Admin commands need
/// the [`ADMIN`] role.
pub fn protocol() -> Protocol {
    let mut protocol = Protocol::builder();
    protocol
        .add_event(MOVEMENT, "movement")
        .and_then(|p| p.add_event(CHAT, "chat"))
        .and_then(|p| p.add_event(ADMIN_COMMAND, "admin_command"))
        .and_then(|p| p.add_event(WHISPER, "whisper"))
        .and_then(|p| p.allow_outbound(HostType::Server, MOVEMENT))
        .and_then(|p| p.allow_outbound(HostType::Server, CHAT))
        .and_then(|p| p.allow_outbound(HostType::Server, WHISPER))
        .and_then(|p| p.allow_inbound(HostType::Server, CHAT))
        .and_then(|p| p.allow_inbound(HostType::Server, ADMIN_COMMAND))
        .and_then(|p| p.require_role(ADMIN_COMMAND, ADMIN))
        .expect("test protocol is valid");
    protocol.build()
}

const SCOPE_ENTITY: u8 = 0;
const SCOPE_SEGMENT: u8 = 1;
const SCOPE_CONNECTION: u8 = 2;

/// Byte layout: kind (u16), scope tag (u8) and scope value, source flag
/// (u8) and optional source (u64), then the body. All big-endian.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestCodec;

impl EventCodec<TestEvent> for TestCodec {
    fn encode(&self, event: &TestEvent) -> Result<Vec<u8>, WireError> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&event.kind.to_u16().to_be_bytes());
        match event.scope {
            EventScope::Entity(entity) => {
                bytes.push(SCOPE_ENTITY);
                bytes.extend_from_slice(&entity.to_u64().to_be_bytes());
            }
            EventScope::Segment(segment) => {
                bytes.push(SCOPE_SEGMENT);
                for axis in [segment.x, segment.y, segment.z] {
                    bytes.extend_from_slice(&axis.to_be_bytes());
                }
            }
            EventScope::Connection(connection) => {
                bytes.push(SCOPE_CONNECTION);
                bytes.extend_from_slice(&connection.to_u64().to_be_bytes());
            }
        }
        match event.source {
            Some(source) => {
                bytes.push(1);
                bytes.extend_from_slice(&source.to_u64().to_be_bytes());
            }
            None => bytes.push(0),
        }
        bytes.extend_from_slice(&event.body);
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<TestEvent, WireError> {
        let mut reader = Reader { bytes };
        let kind = EventKind::new(u16::from_be_bytes(reader.take()?));
        let scope = match reader.take::<1>()?[0] {
            SCOPE_ENTITY => EventScope::Entity(EntityId::from_u64(u64::from_be_bytes(reader.take()?))),
            SCOPE_SEGMENT => {
                let x = i32::from_be_bytes(reader.take()?);
                let y = i32::from_be_bytes(reader.take()?);
                let z = i32::from_be_bytes(reader.take()?);
                EventScope::Segment(GridPosition::new(x, y, z))
            }
            SCOPE_CONNECTION => {
                EventScope::Connection(ConnectionKey::from_u64(u64::from_be_bytes(reader.take()?)))
            }
            tag => {
                return Err(WireError::Decode {
                    reason: format!("unknown scope tag {}", tag),
                })
            }
        };
        let source = match reader.take::<1>()?[0] {
            0 => None,
            _ => Some(EntityId::from_u64(u64::from_be_bytes(reader.take()?))),
        };
        Ok(TestEvent {
            kind,
            scope,
            source,
            body: reader.bytes.to_vec(),
        })
    }
}

struct Reader<'b> {
    bytes: &'b [u8],
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let Some((head, rest)) = self.bytes.split_first_chunk::<N>() else {
            return Err(WireError::Decode {
                reason: format!("expected {} more bytes, found {}", N, self.bytes.len()),
            });
        };
        self.bytes = rest;
        Ok(*head)
    }
}
