use thiserror::Error;

use super::{position::GridPosition, segment_state::SegmentState};

/// Errors raised by segment configuration and segment lifecycle changes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    /// Segment edge length must be a positive, finite number
    #[error("Invalid segment edge length {edge_length}: must be positive and finite")]
    InvalidEdgeLength { edge_length: f64 },

    /// Segment lifecycle transition is not allowed from the current state
    #[error("Segment {segment} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        segment: GridPosition,
        from: SegmentState,
        to: SegmentState,
    },
}
