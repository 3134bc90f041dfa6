/// Load lifecycle of a world segment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SegmentState {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Unloading,
}

impl SegmentState {
    pub fn can_transition_to(self, next: SegmentState) -> bool {
        matches!(
            (self, next),
            (SegmentState::Unloaded, SegmentState::Loading)
                | (SegmentState::Loading, SegmentState::Loaded)
                // load cancelled before the data arrived
                | (SegmentState::Loading, SegmentState::Unloading)
                | (SegmentState::Loaded, SegmentState::Unloading)
                | (SegmentState::Unloading, SegmentState::Unloaded)
        )
    }

    pub fn is_loaded(self) -> bool {
        self == SegmentState::Loaded
    }
}
