use std::collections::HashMap;

use log::debug;

use tessera_shared::{GridPosition, SegmentError, SegmentResolver, SegmentState};

use crate::persistence::{NoPersistence, Persistence};

/// Drives the load lifecycle of world segments against a [`Persistence`]
pub struct SegmentLoader {
    persistence: Box<dyn Persistence>,
    states: HashMap<GridPosition, SegmentState>,
}

impl SegmentLoader {
    pub fn new<P: Persistence + 'static>(persistence: P) -> Self {
        Self {
            persistence: Box::new(persistence),
            states: HashMap::new(),
        }
    }

    pub fn set_persistence<P: Persistence + 'static>(&mut self, persistence: P) {
        self.persistence = Box::new(persistence);
    }

    /// Starts loading a segment, asking persistence for its contents.
    /// Returns false if it is already loading or loaded.
    pub fn request_load(
        &mut self,
        segment: GridPosition,
        resolver: &SegmentResolver,
    ) -> Result<bool, SegmentError> {
        let state = self.state(&segment);
        if matches!(state, SegmentState::Loading | SegmentState::Loaded) {
            return Ok(false);
        }
        self.transition(segment, SegmentState::Loading)?;

        let range = resolver.range_of(&segment);
        self.persistence
            .retrieve_entities_in_range(range.min, range.max);
        debug!("Loading segment {}", segment);
        Ok(true)
    }

    /// Marks a Loading segment as Loaded once its contents have arrived
    pub fn mark_loaded(&mut self, segment: GridPosition) -> Result<(), SegmentError> {
        self.transition(segment, SegmentState::Loaded)?;
        debug!("Segment {} loaded", segment);
        Ok(())
    }

    /// Writes the segment back and forgets it.
    /// Returns false if it was not loading or loaded.
    pub fn request_unload(&mut self, segment: GridPosition) -> Result<bool, SegmentError> {
        if self.state(&segment) == SegmentState::Unloaded {
            return Ok(false);
        }
        self.transition(segment, SegmentState::Unloading)?;
        self.persistence.synchronize();
        self.transition(segment, SegmentState::Unloaded)?;
        debug!("Segment {} unloaded", segment);
        Ok(true)
    }

    pub fn state(&self, segment: &GridPosition) -> SegmentState {
        self.states.get(segment).copied().unwrap_or_default()
    }

    pub fn loaded_segments(&self) -> Vec<GridPosition> {
        let mut segments: Vec<GridPosition> = self
            .states
            .iter()
            .filter(|(_, state)| state.is_loaded())
            .map(|(segment, _)| *segment)
            .collect();
        segments.sort();
        segments
    }

    pub fn synchronize(&mut self) {
        self.persistence.synchronize();
    }

    fn transition(&mut self, segment: GridPosition, to: SegmentState) -> Result<(), SegmentError> {
        let from = self.state(&segment);
        if !from.can_transition_to(to) {
            return Err(SegmentError::InvalidTransition { segment, from, to });
        }
        if to == SegmentState::Unloaded {
            self.states.remove(&segment);
        } else {
            self.states.insert(segment, to);
        }
        Ok(())
    }
}

impl Default for SegmentLoader {
    fn default() -> Self {
        Self::new(NoPersistence)
    }
}
