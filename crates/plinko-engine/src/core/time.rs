/// Fixed timestep accumulator.
/// Physics advances in constant ticks regardless of frame cadence.
/// Kept in f64 so long runs don't drift the tick count.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    /// The fixed delta time per tick, in seconds.
    tick: f64,
    /// Largest frame delta accepted; anything above is clamped so a stall
    /// (backgrounded tab, debugger) doesn't trigger a catch-up burst.
    max_frame_delta: f64,
    /// Accumulated time not yet consumed by ticks. Always `< tick`.
    residual: f64,
    total_ticks: u64,
}

impl SimulationClock {
    pub fn new(tick: f64, max_frame_delta: f64) -> Self {
        Self {
            tick,
            max_frame_delta,
            residual: 0.0,
            total_ticks: 0,
        }
    }

    /// Clamp a raw frame delta into `[0, max_frame_delta]`.
    /// Negative or non-finite deltas count as zero.
    pub fn clamp_delta(&self, frame_dt: f64) -> f64 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            0.0
        } else {
            frame_dt.min(self.max_frame_delta)
        }
    }

    /// Add frame time to the accumulator. Returns the number of fixed ticks to run.
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        self.residual += self.clamp_delta(frame_dt);
        let mut steps = 0;
        while self.residual >= self.tick {
            self.residual -= self.tick;
            steps += 1;
        }
        self.total_ticks += u64::from(steps);
        steps
    }

    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// The fixed delta time.
    pub fn tick(&self) -> f64 {
        self.tick
    }

    pub fn max_frame_delta(&self) -> f64 {
        self.max_frame_delta
    }

    /// Ticks run since creation.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Simulated seconds elapsed.
    pub fn simulated_time(&self) -> f64 {
        self.total_ticks as f64 * self.tick
    }

    /// Drop any residual and the tick counter.
    pub fn reset(&mut self) {
        self.residual = 0.0;
        self.total_ticks = 0;
    }
}
