/// Commands the host can send to a running simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Drop one ball now.
    SpawnBall,
    /// Drop `count` balls, `delay_ms` apart.
    SpawnBatch { count: u32, delay_ms: f64 },
    /// Drop all still-pending batch spawns.
    CancelBatch,
    /// Toggle the collider wireframe.
    SetDebug(bool),
    /// Remove every ball and reset counters and the clock.
    Reset,
}

/// A queue of input events.
/// The host pushes commands between frames; the simulation drains them at
/// the start of the next frame, so they never interleave with a step.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events, oldest first.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
