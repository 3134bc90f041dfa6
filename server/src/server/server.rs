use std::{collections::HashSet, mem, time::Instant};

use log::{debug, info, warn};

use tessera_shared::{
    accept_all, ComponentError, ComponentEvent, ComponentEventFilter, ConnectionKey, ConnectionState, EntityFilter,
    EntityId, Event, EventCodec, GridPosition, InboundEnvelope, OutboundEnvelope, Position,
    Protocol, Role, SegmentIndexer, SegmentResolver, SegmentState, Tick, Velocity, WirePayload,
    World,
};

use crate::{
    connection::routing_table::{RoutingTable, TrustViolation, TrustViolationKind},
    events::{IndexerKey, TickEvents, WorldEvents},
    movement_notifier::{MovementNotifier, MovementUpdate},
    persistence::{NoPersistence, Persistence},
    pipeline::{standard_inbound, standard_outbound, InboundPipeline, OutboundPipeline},
    segment::SegmentLoader,
    server::{ServerConfig, TimeManager},
    transport::{PacketReceiver, PacketSender},
    TesseraServerError,
};

/// Authoritative tick loop: owns the world, the segment indexers, the
/// replication pipelines and the connection registry.
///
/// A tick is driven from outside, in this order:
/// [`receive_all_packets`](Self::receive_all_packets), simulation work on
/// [`world_mut`](Self::world_mut), [`commit_tick`](Self::commit_tick), then
/// [`send_all_packets`](Self::send_all_packets).
pub struct Server<M: Event + Clone + From<MovementUpdate>> {
    // Config
    config: ServerConfig,
    protocol: Protocol,
    codec: Box<dyn EventCodec<M>>,
    // Io
    packet_sender: Option<Box<dyn PacketSender>>,
    packet_receiver: Option<Box<dyn PacketReceiver>>,
    // World
    world: World,
    resolver: SegmentResolver,
    indexers: Vec<SegmentIndexer>,
    segments: SegmentLoader,
    // Replication
    routing: RoutingTable,
    outbound: OutboundPipeline<M>,
    inbound: InboundPipeline<M>,
    outgoing_events: Vec<M>,
    incoming_events: Vec<InboundEnvelope<M>>,
    // Movement
    movement: MovementNotifier,
    movement_events: ComponentEventFilter,
    time_manager: TimeManager,
}

impl<M: Event + Clone + From<MovementUpdate>> Server<M> {
    /// Create a new Server. Fails if the configuration is invalid.
    pub fn new<C: EventCodec<M> + 'static>(
        config: ServerConfig,
        mut protocol: Protocol,
        codec: C,
    ) -> Result<Self, TesseraServerError> {
        if config.tick_interval.is_zero() {
            return Err(TesseraServerError::InvalidTickInterval);
        }
        let resolver = SegmentResolver::new(&config.segment)?;
        let movement = MovementNotifier::new(&config.movement)?;
        protocol.lock();

        let mut world = World::new();
        world.register::<Position>()?;
        world.register::<Velocity>()?;
        let movement_events = ComponentEventFilter::new(world.subscribe::<Position>()?, accept_all());

        let outbound = standard_outbound(protocol.outbound_allow_list(config.role));
        let inbound = standard_inbound(
            protocol.required_roles().clone(),
            protocol.inbound_allow_list(config.role),
        );
        let time_manager = TimeManager::new(config.tick_interval, config.max_catch_up_ticks);

        Ok(Self {
            config,
            protocol,
            codec: Box::new(codec),
            packet_sender: None,
            packet_receiver: None,
            world,
            resolver,
            indexers: Vec::new(),
            segments: SegmentLoader::new(NoPersistence),
            routing: RoutingTable::new(),
            outbound,
            inbound,
            outgoing_events: Vec::new(),
            incoming_events: Vec::new(),
            movement,
            movement_events,
            time_manager,
        })
    }

    /// Attaches the packet queues shared with the network side
    pub fn io_load(
        &mut self,
        packet_sender: Box<dyn PacketSender>,
        packet_receiver: Box<dyn PacketReceiver>,
    ) {
        self.packet_sender = Some(packet_sender);
        self.packet_receiver = Some(packet_receiver);
        info!("Server io loaded");
    }

    pub fn persistence_load<P: Persistence + 'static>(&mut self, persistence: P) {
        self.segments.set_persistence(persistence);
    }

    /// Returns whether packet queues have been attached
    pub fn is_listening(&self) -> bool {
        self.packet_sender.is_some() && self.packet_receiver.is_some()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn resolver(&self) -> &SegmentResolver {
        &self.resolver
    }

    // Connections

    pub fn accept_connection(&mut self) -> ConnectionKey {
        self.routing.accept()
    }

    pub fn establish_connection(&mut self, connection: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.routing.establish(connection)
    }

    /// Binds a connection to the entity it acts for. Inbound events from
    /// that connection are attributed to this entity from now on.
    pub fn authenticate(
        &mut self,
        connection: &ConnectionKey,
        entity: EntityId,
    ) -> Result<(), TesseraServerError> {
        self.routing.authenticate(connection, entity)
    }

    pub fn subscribe(
        &mut self,
        connection: &ConnectionKey,
        segment: GridPosition,
    ) -> Result<bool, TesseraServerError> {
        self.routing.subscribe(connection, segment)
    }

    pub fn unsubscribe(
        &mut self,
        connection: &ConnectionKey,
        segment: &GridPosition,
    ) -> Result<bool, TesseraServerError> {
        self.routing.unsubscribe(connection, segment)
    }

    /// Marks a connection as errored. Nothing more is routed to it.
    pub fn fail_connection(&mut self, connection: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.routing.fail(connection)
    }

    pub fn reset_connection(&mut self, connection: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.routing.reset(connection)
    }

    pub fn reconnect(&mut self, connection: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.routing.reconnect(connection)
    }

    pub fn disconnect(&mut self, connection: &ConnectionKey) -> Result<(), TesseraServerError> {
        self.routing.disconnect(connection)
    }

    pub fn connection_state(
        &self,
        connection: &ConnectionKey,
    ) -> Result<ConnectionState, TesseraServerError> {
        self.routing.state(connection)
    }

    pub fn connection_keys(&self) -> Vec<ConnectionKey> {
        self.routing.connection_keys()
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing
    }

    // Roles

    pub fn grant_role(&mut self, entity: EntityId, role: Role) -> bool {
        self.routing.grant_role(entity, role)
    }

    pub fn revoke_role(&mut self, entity: &EntityId, role: &Role) -> bool {
        self.routing.revoke_role(entity, role)
    }

    // World

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutations are staged until [`commit_tick`](Self::commit_tick)
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Adds a segment indexer for the entities `filter` accepts
    pub fn add_indexer<F: EntityFilter + 'static>(
        &mut self,
        filter: F,
    ) -> Result<IndexerKey, TesseraServerError> {
        let indexer = SegmentIndexer::new(&mut self.world, self.resolver, filter)?;
        self.indexers.push(indexer);
        Ok(IndexerKey::new(self.indexers.len() - 1))
    }

    pub fn indexer(&self, key: IndexerKey) -> Result<&SegmentIndexer, TesseraServerError> {
        self.indexers
            .get(key.index())
            .ok_or(TesseraServerError::IndexerNotFound { key })
    }

    pub fn indexer_mut(&mut self, key: IndexerKey) -> Result<&mut SegmentIndexer, TesseraServerError> {
        self.indexers
            .get_mut(key.index())
            .ok_or(TesseraServerError::IndexerNotFound { key })
    }

    pub fn members_of(
        &self,
        key: IndexerKey,
        segment: &GridPosition,
    ) -> Result<HashSet<EntityId>, TesseraServerError> {
        Ok(self.indexer(key)?.members_of(segment))
    }

    /// Replaces which entities get movement broadcasts. Changes committed
    /// before this call are not seen by the new filter.
    pub fn set_movement_filter<F: EntityFilter + 'static>(
        &mut self,
        filter: F,
    ) -> Result<(), TesseraServerError> {
        let receiver = self.world.subscribe::<Position>()?;
        self.movement_events = ComponentEventFilter::new(receiver, filter);
        Ok(())
    }

    // Pipelines

    /// Appends custom stages after the standard outbound ones
    pub fn outbound_pipeline_mut(&mut self) -> &mut OutboundPipeline<M> {
        &mut self.outbound
    }

    /// Appends custom stages after the standard inbound ones
    pub fn inbound_pipeline_mut(&mut self) -> &mut InboundPipeline<M> {
        &mut self.inbound
    }

    // Incoming

    /// Drains the inbound packet queue through the inbound pipeline
    pub fn receive_all_packets(&mut self) {
        let Some(packet_receiver) = self.packet_receiver.as_mut() else {
            return;
        };

        let mut received = Vec::new();
        loop {
            match packet_receiver.receive() {
                Ok(Some((connection, payload))) => {
                    let decoded = WirePayload::from_bytes(&payload)
                        .and_then(|wire| Ok((wire.nonce, self.codec.decode(&wire.event)?)));
                    match decoded {
                        Ok((nonce, event)) => {
                            received.push(InboundEnvelope::new(connection, nonce, event));
                        }
                        Err(error) => {
                            debug!("Malformed payload from {}: {}", connection, error);
                            self.routing.record_violation(TrustViolation {
                                connection,
                                kind: None,
                                violation: TrustViolationKind::MalformedPayload,
                            });
                        }
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    warn!("Server Error: {}", error);
                    break;
                }
            }
        }

        let accepted = self.inbound.process_all(&mut self.routing, received);
        self.incoming_events.extend(accepted);
    }

    /// Inbound events that passed every inbound stage, in arrival order
    pub fn take_inbound_events(&mut self) -> Vec<InboundEnvelope<M>> {
        mem::take(&mut self.incoming_events)
    }

    pub fn take_trust_violations(&mut self) -> Vec<TrustViolation> {
        self.routing.take_trust_violations()
    }

    // Ticks

    /// Polls the clock. Overdue ticks beyond `max_catch_up_ticks` are
    /// skipped and their movement schedules expire.
    pub fn take_tick_events(&mut self, now: Instant) -> TickEvents {
        let advance = self.time_manager.recv_server_tick(now);
        if advance.skipped > 0 {
            warn!("Server fell behind, skipping {} ticks", advance.skipped);
            self.movement.skip_ticks(advance.skipped);
        }
        let first = self.movement.current_tick();
        let ticks = (0..advance.elapsed)
            .map(|offset| first.wrapping_add(offset))
            .collect();
        TickEvents::new(ticks, advance.skipped)
    }

    pub fn current_tick(&self) -> Tick {
        self.movement.current_tick()
    }

    /// Commits the world, updates every indexer and queues due movement
    /// broadcasts, then advances the tick. A failing indexer or movement
    /// subscription does not stop the rest of the tick; the first failure
    /// is returned once the tick has advanced.
    pub fn commit_tick(&mut self) -> Result<WorldEvents, TesseraServerError> {
        self.world.commit();

        let mut first_error = None;
        let mut events = WorldEvents::new();
        for (index, indexer) in self.indexers.iter_mut().enumerate() {
            let update = indexer.update(&self.world);
            let Some(segment_events) = keep_first_error(&mut first_error, update) else {
                continue;
            };
            for event in segment_events {
                events.push_segment_event(IndexerKey::new(index), event);
            }
        }

        let movement_events =
            keep_first_error(&mut first_error, self.movement_events.receive(&self.world));
        for event in movement_events.unwrap_or_default() {
            if let ComponentEvent::Added(entity) | ComponentEvent::Modified(entity) = event {
                self.movement.schedule_entity(entity);
            }
        }
        let updates = self.movement.send_scheduled(&self.world, &self.resolver);
        events.set_movement_updates(updates.len());
        self.outgoing_events
            .extend(updates.into_iter().map(M::from));

        match first_error {
            Some(error) => Err(error),
            None => Ok(events),
        }
    }

    // Outgoing

    /// Queues an event for the outbound pipeline
    pub fn queue_event(&mut self, event: M) {
        self.outgoing_events.push(event);
    }

    /// Routes every queued event and hands the payloads to the packet
    /// queue. Returns how many payloads were handed over.
    pub fn send_all_packets(&mut self) -> usize {
        let events = mem::take(&mut self.outgoing_events);
        if events.is_empty() {
            return 0;
        }
        let envelopes = events.into_iter().map(OutboundEnvelope::new).collect();
        let routed = self.outbound.process_all(&mut self.routing, envelopes);

        let Some(packet_sender) = self.packet_sender.as_ref() else {
            warn!("Server Error: io not loaded, dropping {} packets", routed.len());
            return 0;
        };

        let mut sent = 0;
        for envelope in routed {
            let Some(connection) = envelope.destination else {
                continue;
            };
            let event = match self.codec.encode(&envelope.event) {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!("Server Error: {}", error);
                    continue;
                }
            };
            let Some(nonce) = self.routing.next_nonce(&connection) else {
                continue;
            };
            let payload = WirePayload::new(nonce, event);
            match packet_sender.send(&connection, &payload.to_bytes()) {
                Ok(()) => sent += 1,
                Err(error) => warn!("Server Error: {}", error),
            }
        }
        sent
    }

    // Segments

    /// Returns false if the segment is already loading or loaded
    pub fn load_segment(&mut self, segment: GridPosition) -> Result<bool, TesseraServerError> {
        Ok(self.segments.request_load(segment, &self.resolver)?)
    }

    pub fn segment_loaded(&mut self, segment: GridPosition) -> Result<(), TesseraServerError> {
        Ok(self.segments.mark_loaded(segment)?)
    }

    /// Returns false if the segment was not loading or loaded
    pub fn unload_segment(&mut self, segment: GridPosition) -> Result<bool, TesseraServerError> {
        Ok(self.segments.request_unload(segment)?)
    }

    pub fn segment_state(&self, segment: &GridPosition) -> SegmentState {
        self.segments.state(segment)
    }

    pub fn loaded_segments(&self) -> Vec<GridPosition> {
        self.segments.loaded_segments()
    }

    pub fn synchronize(&mut self) {
        self.segments.synchronize();
    }
}

// Logs a failure, remembering it if it is the first one this tick
fn keep_first_error<T>(
    first_error: &mut Option<TesseraServerError>,
    result: Result<T, ComponentError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!("Server Error: {}", error);
            if first_error.is_none() {
                *first_error = Some(error.into());
            }
            None
        }
    }
}
