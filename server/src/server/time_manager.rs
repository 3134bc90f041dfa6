use std::time::{Duration, Instant};

/// Turns wall-clock time into a count of elapsed fixed-length ticks
pub struct TimeManager {
    tick_interval: Duration,
    max_catch_up_ticks: u16,
    last_tick_instant: Option<Instant>,
}

/// Result of polling the [`TimeManager`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickAdvance {
    /// Ticks that should be run now
    pub elapsed: u16,
    /// Overdue ticks beyond the catch-up limit, which are not run
    pub skipped: u16,
}

impl TimeManager {
    pub fn new(tick_interval: Duration, max_catch_up_ticks: u16) -> Self {
        Self {
            tick_interval,
            max_catch_up_ticks,
            last_tick_instant: None,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// The first call starts the clock and reports no ticks
    pub fn recv_server_tick(&mut self, now: Instant) -> TickAdvance {
        let Some(last) = self.last_tick_instant else {
            self.last_tick_instant = Some(now);
            return TickAdvance::default();
        };
        if self.tick_interval.is_zero() || now <= last {
            return TickAdvance::default();
        }

        let interval_nanos = self.tick_interval.as_nanos();
        let ticks = (now - last).as_nanos() / interval_nanos;
        if ticks == 0 {
            return TickAdvance::default();
        }

        // advance by whole ticks only, so the remainder carries over
        let consumed = u32::try_from(ticks)
            .ok()
            .and_then(|ticks| self.tick_interval.checked_mul(ticks))
            .and_then(|span| last.checked_add(span))
            .unwrap_or(now);
        self.last_tick_instant = Some(consumed);

        let ticks = u16::try_from(ticks).unwrap_or(u16::MAX);
        let elapsed = ticks.min(self.max_catch_up_ticks.max(1));
        TickAdvance {
            elapsed,
            skipped: ticks - elapsed,
        }
    }
}
