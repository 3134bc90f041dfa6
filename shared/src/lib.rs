//! # Tessera Shared
//! Component storage, world segment indexing and replication pipeline
//! primitives shared by the tessera crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod connection;
mod events;
mod pipeline;
mod protocol;
mod types;
mod world;
mod wrapping_number;

pub use connection::{
    connection_key::ConnectionKey,
    connection_state::ConnectionState,
    error::{ConnectionError, WireError},
    wire::{EventCodec, WirePayload, NONCE_BYTES},
};
pub use events::{
    allow_list::AllowList,
    event::{Event, EventKind, EventScope},
    event_kinds::EventKinds,
    role::{Role, RoleSet},
};
pub use pipeline::{
    envelope::{InboundEnvelope, OutboundEnvelope},
    stage::{Pipeline, PipelineStage},
};
pub use protocol::{Protocol, ProtocolError, ProtocolPlugin};
pub use types::{HostType, Tick};
pub use world::{
    component::{
        component_event::{ComponentEvent, ComponentEventReceiver},
        component_filter::{accept_all, has_component, ComponentEventFilter, EntityFilter, HasComponent},
        component_store::{Component, ComponentStore},
        error::ComponentError,
    },
    entity::EntityId,
    segment::{
        error::SegmentError,
        indexer::{SegmentEvent, SegmentIndexer},
        position::{GridPosition, Position, Velocity},
        resolver::{SegmentConfig, SegmentRange, SegmentResolver},
        segment_state::SegmentState,
    },
    world::World,
};
pub use wrapping_number::{sequence_greater_than, sequence_less_than, wrapping_diff};
