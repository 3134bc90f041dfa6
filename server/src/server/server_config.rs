use std::{default::Default, time::Duration};

use tessera_shared::{HostType, SegmentConfig};

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Which side of the protocol's allow-lists this server uses
    pub role: HostType,
    /// Fixed duration of one simulation tick
    pub tick_interval: Duration,
    /// When the tick loop falls behind, at most this many overdue ticks are
    /// run back to back. The rest are skipped.
    pub max_catch_up_ticks: u16,
    /// Used to partition space into world segments
    pub segment: SegmentConfig,
    /// Used to configure movement broadcasts
    pub movement: MovementConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            role: HostType::Server,
            tick_interval: Duration::from_millis(10),
            max_catch_up_ticks: 4,
            segment: SegmentConfig::default(),
            movement: MovementConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementConfig {
    /// Ticks between a position change and its broadcast
    pub delay_ticks: u16,
    /// How many ticks late a scheduled broadcast may still go out
    pub stale_tolerance: u16,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            delay_ticks: 3,
            stale_tolerance: 1,
        }
    }
}
