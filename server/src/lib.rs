//! # Tessera Server
//! An authoritative tick loop that stores entity components, indexes
//! entities into world segments, and replicates events to the connections
//! for which they are in scope.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;

mod connection;
mod error;
mod event_sender;
mod events;
mod handler_registry;
mod movement_notifier;
mod persistence;
mod pipeline;
mod segment;
mod server;

pub use connection::{
    connection::Connection,
    routing_table::{RoutingTable, TrustViolation, TrustViolationKind},
};
pub use error::TesseraServerError;
pub use event_sender::{event_channel, EventQueue, EventSender};
pub use events::{IndexerKey, TickEvents, WorldEvents};
pub use handler_registry::HandlerRegistry;
pub use movement_notifier::{MovementNotifier, MovementUpdate, MAX_MOVEMENT_DELAY};
pub use persistence::{NoPersistence, Persistence};
pub use pipeline::{
    standard_inbound, standard_outbound, ConnectionMappingStage, InboundAllowStage,
    InboundPipeline, OutboundAllowStage, OutboundPipeline, PermissionStage, SegmentFanOutStage,
    SourceEntityStage,
};
pub use segment::SegmentLoader;
pub use server::{MovementConfig, Server, ServerConfig, TickAdvance, TimeManager};
pub use transport::{IoEndpoint, PacketChannel, PacketReceiver, PacketSender, TransportError};
