use log::trace;

use tessera_shared::{AllowList, Event, EventScope, OutboundEnvelope, PipelineStage};

use crate::connection::routing_table::RoutingTable;

/// Drops outbound events whose kind is not allowed for this host
pub struct OutboundAllowStage {
    allow_list: AllowList,
}

impl OutboundAllowStage {
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }
}

impl<M: Event> PipelineStage<RoutingTable, OutboundEnvelope<M>> for OutboundAllowStage {
    fn name(&self) -> &'static str {
        "outbound_allow"
    }

    fn process(
        &mut self,
        _: &mut RoutingTable,
        envelope: OutboundEnvelope<M>,
        forward: &mut Vec<OutboundEnvelope<M>>,
    ) {
        let kind = envelope.event.kind();
        if self.allow_list.contains(&kind) {
            forward.push(envelope);
        } else {
            trace!("{} is not allowed outbound, dropping", kind);
        }
    }
}

/// Resolves entity and connection scoped events to a live connection.
/// Segment scoped events pass through untouched.
pub struct ConnectionMappingStage;

impl<M: Event> PipelineStage<RoutingTable, OutboundEnvelope<M>> for ConnectionMappingStage {
    fn name(&self) -> &'static str {
        "connection_mapping"
    }

    fn process(
        &mut self,
        table: &mut RoutingTable,
        mut envelope: OutboundEnvelope<M>,
        forward: &mut Vec<OutboundEnvelope<M>>,
    ) {
        if let Some(destination) = envelope.destination {
            if table.is_routable(&destination) {
                forward.push(envelope);
            } else {
                trace!("{} is not routable, dropping", destination);
            }
            return;
        }

        match envelope.event.scope() {
            EventScope::Entity(entity) => match table.connection_for_entity(&entity) {
                Some(connection) => {
                    envelope.destination = Some(connection);
                    forward.push(envelope);
                }
                None => trace!("No live connection for {}, dropping", entity),
            },
            EventScope::Connection(connection) => {
                if table.is_routable(&connection) {
                    envelope.destination = Some(connection);
                    forward.push(envelope);
                } else {
                    trace!("{} is not routable, dropping", connection);
                }
            }
            EventScope::Segment(_) => forward.push(envelope),
        }
    }
}

/// Copies segment scoped events once per live subscriber of the segment
pub struct SegmentFanOutStage;

impl<M: Event + Clone> PipelineStage<RoutingTable, OutboundEnvelope<M>> for SegmentFanOutStage {
    fn name(&self) -> &'static str {
        "segment_fan_out"
    }

    fn process(
        &mut self,
        table: &mut RoutingTable,
        envelope: OutboundEnvelope<M>,
        forward: &mut Vec<OutboundEnvelope<M>>,
    ) {
        if envelope.is_routable() {
            forward.push(envelope);
            return;
        }
        let EventScope::Segment(segment) = envelope.event.scope() else {
            trace!("{} has no destination, dropping", envelope.event.kind());
            return;
        };

        let subscribers = table.subscribers_of(&segment);
        let Some((last, rest)) = subscribers.split_last() else {
            trace!("No subscribers for segment {}", segment);
            return;
        };
        for connection in rest {
            forward.push(OutboundEnvelope::routed(envelope.event.clone(), *connection));
        }
        forward.push(OutboundEnvelope::routed(envelope.event, *last));
    }
}
