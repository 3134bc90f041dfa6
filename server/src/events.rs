use std::mem;

use tessera_shared::{EntityId, GridPosition, SegmentEvent, Tick};

/// Identifies a [`SegmentIndexer`](tessera_shared::SegmentIndexer) owned by the server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexerKey(usize);

impl IndexerKey {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// Everything one committed tick produced
pub struct WorldEvents {
    segment_events: Vec<(IndexerKey, SegmentEvent)>,
    movement_updates: usize,
}

impl WorldEvents {
    pub(crate) fn new() -> Self {
        Self {
            segment_events: Vec::new(),
            movement_updates: 0,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.segment_events.is_empty() && self.movement_updates == 0
    }

    /// Enter/Leave notifications in the order the indexers emitted them
    pub fn segment_events(&self) -> &[(IndexerKey, SegmentEvent)] {
        &self.segment_events
    }

    pub fn take_segment_events(&mut self) -> Vec<(IndexerKey, SegmentEvent)> {
        mem::take(&mut self.segment_events)
    }

    pub fn enters(&self, key: IndexerKey) -> impl Iterator<Item = (GridPosition, EntityId)> + '_ {
        self.segment_events
            .iter()
            .filter_map(move |(indexer, event)| match event {
                SegmentEvent::Enter { segment, entity } if *indexer == key => {
                    Some((*segment, *entity))
                }
                _ => None,
            })
    }

    pub fn leaves(&self, key: IndexerKey) -> impl Iterator<Item = (GridPosition, EntityId)> + '_ {
        self.segment_events
            .iter()
            .filter_map(move |(indexer, event)| match event {
                SegmentEvent::Leave { segment, entity } if *indexer == key => {
                    Some((*segment, *entity))
                }
                _ => None,
            })
    }

    /// Movement updates queued for sending this tick
    pub fn movement_update_count(&self) -> usize {
        self.movement_updates
    }

    // Crate-public

    pub(crate) fn push_segment_event(&mut self, key: IndexerKey, event: SegmentEvent) {
        self.segment_events.push((key, event));
    }

    pub(crate) fn set_movement_updates(&mut self, count: usize) {
        self.movement_updates = count;
    }
}

/// Ticks that became due since the last poll
pub struct TickEvents {
    ticks: Vec<Tick>,
    skipped: u16,
}

impl TickEvents {
    pub(crate) fn new(ticks: Vec<Tick>, skipped: u16) -> Self {
        Self { ticks, skipped }
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Ticks to run, oldest first. Run each with `Server::commit_tick`.
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Overdue ticks that were dropped instead of run
    pub fn skipped(&self) -> u16 {
        self.skipped
    }
}
