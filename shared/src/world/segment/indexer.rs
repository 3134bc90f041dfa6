use std::collections::{HashMap, HashSet};

use log::trace;

use crate::{
    world::component::{
        component_event::ComponentEvent,
        component_filter::{ComponentEventFilter, EntityFilter},
        error::ComponentError,
    },
    EntityId, World,
};

use super::{
    position::{GridPosition, Position},
    resolver::SegmentResolver,
};

/// A change in segment membership
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentEvent {
    Enter {
        segment: GridPosition,
        entity: EntityId,
    },
    Leave {
        segment: GridPosition,
        entity: EntityId,
    },
}

impl SegmentEvent {
    pub fn segment(&self) -> GridPosition {
        match self {
            SegmentEvent::Enter { segment, .. } | SegmentEvent::Leave { segment, .. } => *segment,
        }
    }

    pub fn entity(&self) -> EntityId {
        match self {
            SegmentEvent::Enter { entity, .. } | SegmentEvent::Leave { entity, .. } => *entity,
        }
    }
}

/// Tracks which world segment each entity of one category occupies.
///
/// The category is whatever the filter accepts: one indexer per category,
/// all fed by the same [`Position`] store.
pub struct SegmentIndexer {
    resolver: SegmentResolver,
    position_events: ComponentEventFilter,
    entity_segments: HashMap<EntityId, GridPosition>,
    segment_members: HashMap<GridPosition, HashSet<EntityId>>,
}

impl SegmentIndexer {
    /// Subscribes to the World's [`Position`] store
    pub fn new<F: EntityFilter + 'static>(
        world: &mut World,
        resolver: SegmentResolver,
        filter: F,
    ) -> Result<Self, ComponentError> {
        let receiver = world.subscribe::<Position>()?;
        Ok(Self {
            resolver,
            position_events: ComponentEventFilter::new(receiver, filter),
            entity_segments: HashMap::new(),
            segment_members: HashMap::new(),
        })
    }

    /// Processes everything committed since the last update. Leave always
    /// precedes the matching Enter for a moving entity. Entities the filter
    /// stops accepting leave their segment, and removals of indexed
    /// entities are honored whatever the filter says.
    pub fn update(&mut self, world: &World) -> Result<Vec<SegmentEvent>, ComponentError> {
        let mut output = Vec::new();
        let positions = world.store::<Position>();

        for (event, accepted) in self.position_events.receive_classified(world)? {
            let entity = event.entity();
            let position = positions.and_then(|store| store.get(&entity));
            match (event, position) {
                (ComponentEvent::Removed(_), _) | (_, None) => {
                    output.extend(self.remove_entity(&entity));
                }
                (_, Some(_)) if !accepted => {
                    output.extend(self.remove_entity(&entity));
                }
                (ComponentEvent::Added(_) | ComponentEvent::Modified(_), Some(position)) => {
                    let segment = self.resolver.segment_of(position);
                    self.move_entity(entity, segment, &mut output);
                }
            }
        }

        Ok(output)
    }

    /// Drops an entity from the index, for example when it stops belonging to
    /// this indexer's category while keeping its position
    pub fn remove_entity(&mut self, entity: &EntityId) -> Option<SegmentEvent> {
        let segment = self.entity_segments.remove(entity)?;
        self.remove_member(&segment, entity);
        trace!("{} left segment {}", entity, segment);
        Some(SegmentEvent::Leave {
            segment,
            entity: *entity,
        })
    }

    /// Members as of the last processed commit. Empty for unknown segments.
    pub fn members_of(&self, segment: &GridPosition) -> HashSet<EntityId> {
        self.segment_members
            .get(segment)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_member(&self, segment: &GridPosition, entity: &EntityId) -> bool {
        self.segment_members
            .get(segment)
            .is_some_and(|members| members.contains(entity))
    }

    pub fn member_count(&self, segment: &GridPosition) -> usize {
        self.segment_members.get(segment).map_or(0, HashSet::len)
    }

    /// None until the entity's first position commit has been processed
    pub fn segment_of_entity(&self, entity: &EntityId) -> Option<GridPosition> {
        self.entity_segments.get(entity).copied()
    }

    /// Segments with at least one member
    pub fn occupied_segments(&self) -> impl Iterator<Item = &GridPosition> {
        self.segment_members.keys()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_segments.len()
    }

    pub fn resolver(&self) -> &SegmentResolver {
        &self.resolver
    }

    // Private

    fn move_entity(
        &mut self,
        entity: EntityId,
        segment: GridPosition,
        output: &mut Vec<SegmentEvent>,
    ) {
        if let Some(previous) = self.entity_segments.get(&entity).copied() {
            if previous == segment {
                return;
            }
            self.remove_member(&previous, &entity);
            output.push(SegmentEvent::Leave {
                segment: previous,
                entity,
            });
        }

        self.entity_segments.insert(entity, segment);
        self.segment_members
            .entry(segment)
            .or_default()
            .insert(entity);
        trace!("{} entered segment {}", entity, segment);
        output.push(SegmentEvent::Enter { segment, entity });
    }

    fn remove_member(&mut self, segment: &GridPosition, entity: &EntityId) {
        let Some(members) = self.segment_members.get_mut(segment) else {
            return;
        };
        members.remove(entity);
        if members.is_empty() {
            self.segment_members.remove(segment);
        }
    }
}
