//! Fixed-timestep accumulator for the frame loop.

/// Largest frame delta honored; longer stalls are dropped rather than
/// replayed as a burst of ticks.
const MAX_FRAME_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct TickClock {
    tick_ms: u64,
    accumulated_ms: u64,
}

impl TickClock {
    pub fn new(tick_ms: u64) -> Self {
        Self {
            tick_ms: tick_ms.max(1),
            accumulated_ms: 0,
        }
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    /// Add elapsed wall time; returns how many fixed ticks are due.
    pub fn advance(&mut self, dt_ms: u64) -> u32 {
        self.accumulated_ms += dt_ms.min(MAX_FRAME_MS);
        let due = self.accumulated_ms / self.tick_ms;
        self.accumulated_ms %= self.tick_ms;
        due as u32
    }
}
