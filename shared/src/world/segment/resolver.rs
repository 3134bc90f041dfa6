use super::{
    error::SegmentError,
    position::{GridPosition, Position},
};

/// Configuration for spatial partitioning
#[derive(Clone, Debug)]
pub struct SegmentConfig {
    /// Edge length of the cubic world segments, in world units
    pub edge_length: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { edge_length: 32.0 }
    }
}

/// Half-open box `[min, max)` on every axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentRange {
    pub min: Position,
    pub max: Position,
}

impl SegmentRange {
    pub fn contains(&self, position: &Position) -> bool {
        (self.min.x..self.max.x).contains(&position.x)
            && (self.min.y..self.max.y).contains(&position.y)
            && (self.min.z..self.max.z).contains(&position.z)
    }
}

// at most this many correction steps after the initial floor
const MAX_CORRECTIONS: usize = 4;

/// Maps positions to segment indices and segment indices back to ranges
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentResolver {
    edge_length: f64,
}

impl SegmentResolver {
    pub fn new(config: &SegmentConfig) -> Result<Self, SegmentError> {
        let edge_length = config.edge_length;
        if !edge_length.is_finite() || edge_length <= 0.0 {
            return Err(SegmentError::InvalidEdgeLength { edge_length });
        }
        Ok(Self { edge_length })
    }

    pub fn edge_length(&self) -> f64 {
        self.edge_length
    }

    /// Segment containing `position`. A position on a lower boundary belongs
    /// to the segment above it, negative coordinates round down.
    pub fn segment_of(&self, position: &Position) -> GridPosition {
        GridPosition::new(
            self.axis_segment(position.x),
            self.axis_segment(position.y),
            self.axis_segment(position.z),
        )
    }

    pub fn range_of(&self, segment: &GridPosition) -> SegmentRange {
        let (min_x, max_x) = self.axis_bounds(f64::from(segment.x));
        let (min_y, max_y) = self.axis_bounds(f64::from(segment.y));
        let (min_z, max_z) = self.axis_bounds(f64::from(segment.z));
        SegmentRange {
            min: Position::new(min_x, min_y, min_z),
            max: Position::new(max_x, max_y, max_z),
        }
    }

    // Private

    fn axis_bounds(&self, segment: f64) -> (f64, f64) {
        // the upper bound is the next segment's lower bound so ranges tile exactly
        (segment * self.edge_length, (segment + 1.0) * self.edge_length)
    }

    fn axis_segment(&self, coordinate: f64) -> i32 {
        let min_segment = f64::from(i32::MIN);
        let max_segment = f64::from(i32::MAX);

        let mut segment = (coordinate / self.edge_length)
            .floor()
            .clamp(min_segment, max_segment);
        if segment.is_nan() {
            return 0;
        }

        // the division can round across a boundary, nudge until the range agrees
        for _ in 0..MAX_CORRECTIONS {
            let (min, max) = self.axis_bounds(segment);
            if coordinate < min && segment > min_segment {
                segment -= 1.0;
            } else if coordinate >= max && segment < max_segment {
                segment += 1.0;
            } else {
                break;
            }
        }

        segment as i32
    }
}
