use std::collections::HashMap;

use log::{debug, trace};

use tessera_shared::{AllowList, Event, EventKind, InboundEnvelope, PipelineStage, Role};

use crate::connection::routing_table::{RoutingTable, TrustViolation, TrustViolationKind};

/// Stamps each inbound event with the entity its connection authenticated
/// as. Events from unauthenticated connections, or naming another entity
/// as their source, are dropped and recorded as trust violations.
pub struct SourceEntityStage;

impl<M: Event> PipelineStage<RoutingTable, InboundEnvelope<M>> for SourceEntityStage {
    fn name(&self) -> &'static str {
        "source_entity"
    }

    fn process(
        &mut self,
        table: &mut RoutingTable,
        mut envelope: InboundEnvelope<M>,
        forward: &mut Vec<InboundEnvelope<M>>,
    ) {
        let connection = envelope.connection;
        if !table.is_routable(&connection) {
            // torn down while the packet was in flight
            trace!("{} is not connected, dropping inbound event", connection);
            return;
        }

        let kind = Some(envelope.event.kind());
        let Some(bound) = table.authenticated_entity(&connection) else {
            table.record_violation(TrustViolation {
                connection,
                kind,
                violation: TrustViolationKind::Unauthenticated,
            });
            return;
        };

        let claimed = envelope.source.or_else(|| envelope.event.claimed_source());
        if let Some(claimed) = claimed {
            if claimed != bound {
                table.record_violation(TrustViolation {
                    connection,
                    kind,
                    violation: TrustViolationKind::SpoofedSource { claimed, bound },
                });
                return;
            }
        }

        envelope.source = Some(bound);
        forward.push(envelope);
    }
}

/// Drops events whose kind requires a role the source entity lacks
pub struct PermissionStage {
    required_roles: HashMap<EventKind, Role>,
}

impl PermissionStage {
    pub fn new(required_roles: HashMap<EventKind, Role>) -> Self {
        Self { required_roles }
    }
}

impl<M: Event> PipelineStage<RoutingTable, InboundEnvelope<M>> for PermissionStage {
    fn name(&self) -> &'static str {
        "permission"
    }

    fn process(
        &mut self,
        table: &mut RoutingTable,
        envelope: InboundEnvelope<M>,
        forward: &mut Vec<InboundEnvelope<M>>,
    ) {
        let kind = envelope.event.kind();
        let Some(role) = self.required_roles.get(&kind) else {
            forward.push(envelope);
            return;
        };

        match envelope.source {
            Some(source) if table.has_role(&source, role) => forward.push(envelope),
            Some(source) => debug!("{} lacks {:?} for {}, dropping", source, role, kind),
            None => debug!("{} from {} has no source, dropping", kind, envelope.connection),
        }
    }
}

/// Drops inbound events whose kind is not allowed for this host
pub struct InboundAllowStage {
    allow_list: AllowList,
}

impl InboundAllowStage {
    pub fn new(allow_list: AllowList) -> Self {
        Self { allow_list }
    }
}

impl<M: Event> PipelineStage<RoutingTable, InboundEnvelope<M>> for InboundAllowStage {
    fn name(&self) -> &'static str {
        "inbound_allow"
    }

    fn process(
        &mut self,
        _: &mut RoutingTable,
        envelope: InboundEnvelope<M>,
        forward: &mut Vec<InboundEnvelope<M>>,
    ) {
        let kind = envelope.event.kind();
        if self.allow_list.contains(&kind) {
            forward.push(envelope);
        } else {
            trace!("{} is not allowed inbound, dropping", kind);
        }
    }
}
