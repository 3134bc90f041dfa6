mod inbound;
mod outbound;

pub use inbound::{InboundAllowStage, PermissionStage, SourceEntityStage};
pub use outbound::{ConnectionMappingStage, OutboundAllowStage, SegmentFanOutStage};

use std::collections::HashMap;

use tessera_shared::{
    AllowList, Event, EventKind, InboundEnvelope, OutboundEnvelope, Pipeline, Role,
};

use crate::connection::routing_table::RoutingTable;

pub type OutboundPipeline<M> = Pipeline<RoutingTable, OutboundEnvelope<M>>;
pub type InboundPipeline<M> = Pipeline<RoutingTable, InboundEnvelope<M>>;

/// Allow-list, then entity/connection mapping, then segment fan-out
pub fn standard_outbound<M: Event + Clone>(allow_list: AllowList) -> OutboundPipeline<M> {
    let mut pipeline = Pipeline::new();
    pipeline
        .push_stage(OutboundAllowStage::new(allow_list))
        .push_stage(ConnectionMappingStage)
        .push_stage(SegmentFanOutStage);
    pipeline
}

/// Source entity, then permissions, then allow-list
pub fn standard_inbound<M: Event>(
    required_roles: HashMap<EventKind, Role>,
    allow_list: AllowList,
) -> InboundPipeline<M> {
    let mut pipeline = Pipeline::new();
    pipeline
        .push_stage(SourceEntityStage)
        .push_stage(PermissionStage::new(required_roles))
        .push_stage(InboundAllowStage::new(allow_list));
    pipeline
}
