use std::collections::HashMap;

use log::trace;

use tessera_shared::{
    sequence_less_than, wrapping_diff, EntityId, GridPosition, Position, SegmentResolver, Tick,
    Velocity, World,
};

use crate::{MovementConfig, TesseraServerError};

/// Longest movement delay accepted, keeping every schedule well inside the
/// half of the tick range that wrapping comparison can order
pub const MAX_MOVEMENT_DELAY: u16 = u16::MAX / 4;

/// A position broadcast produced by the [`MovementNotifier`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementUpdate {
    pub entity: EntityId,
    pub position: Position,
    pub velocity: Option<Velocity>,
    pub segment: GridPosition,
    pub tick: Tick,
}

/// Debounces position changes into at most one broadcast per entity per
/// `delay_ticks` window
pub struct MovementNotifier {
    delay: u16,
    stale_tolerance: u16,
    current_tick: Tick,
    scheduled: HashMap<EntityId, Tick>,
}

impl MovementNotifier {
    pub fn new(config: &MovementConfig) -> Result<Self, TesseraServerError> {
        if config.delay_ticks == 0 || config.delay_ticks > MAX_MOVEMENT_DELAY {
            return Err(TesseraServerError::InvalidMovementDelay {
                delay: config.delay_ticks,
                max: MAX_MOVEMENT_DELAY,
            });
        }
        if config.stale_tolerance > MAX_MOVEMENT_DELAY {
            return Err(TesseraServerError::InvalidStaleTolerance {
                tolerance: config.stale_tolerance,
                max: MAX_MOVEMENT_DELAY,
            });
        }
        Ok(Self {
            delay: config.delay_ticks,
            stale_tolerance: config.stale_tolerance,
            current_tick: 0,
            scheduled: HashMap::new(),
        })
    }

    /// Schedules a broadcast `delay` ticks from now. Returns false if a
    /// schedule due at or after that tick already exists, in which case it
    /// is kept. An earlier schedule is pushed back.
    pub fn schedule_entity(&mut self, entity: EntityId) -> bool {
        let due = self.current_tick.wrapping_add(self.delay);
        if let Some(existing) = self.scheduled.get(&entity) {
            if !sequence_less_than(*existing, due) {
                return false;
            }
        }
        self.scheduled.insert(entity, due);
        true
    }

    /// Processes every schedule due at the current tick, then advances the
    /// tick. Updates carry the committed position and velocity.
    pub fn send_scheduled(&mut self, world: &World, resolver: &SegmentResolver) -> Vec<MovementUpdate> {
        let current_tick = self.current_tick;
        let delay = self.delay;

        let mut due: Vec<(EntityId, u16)> = Vec::new();
        self.scheduled.retain(|entity, due_tick| {
            let lateness = wrapping_diff(*due_tick, current_tick);
            if lateness >= 0 {
                due.push((*entity, lateness.unsigned_abs()));
                false
            } else if lateness.unsigned_abs() > delay {
                // further ahead than one delay, only reachable through a large tick skip
                due.push((*entity, u16::MAX));
                false
            } else {
                true
            }
        });
        due.sort_unstable_by_key(|(entity, _)| *entity);

        let mut updates = Vec::with_capacity(due.len());
        for (entity, lateness) in due {
            if lateness > self.stale_tolerance {
                trace!("Movement schedule for {} expired", entity);
                continue;
            }
            let Some(position) = world.get::<Position>(&entity) else {
                trace!("{} has no position, dropping movement update", entity);
                continue;
            };
            updates.push(MovementUpdate {
                entity,
                position: *position,
                velocity: world.get::<Velocity>(&entity).copied(),
                segment: resolver.segment_of(position),
                tick: current_tick,
            });
        }

        self.current_tick = current_tick.wrapping_add(1);
        updates
    }

    /// Advances the tick without processing, so schedules that fall due in
    /// the skipped span expire
    pub fn skip_ticks(&mut self, ticks: u16) {
        self.current_tick = self.current_tick.wrapping_add(ticks);
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn pending_count(&self) -> usize {
        self.scheduled.len()
    }

    pub fn is_scheduled(&self, entity: &EntityId) -> bool {
        self.scheduled.contains_key(entity)
    }
}
