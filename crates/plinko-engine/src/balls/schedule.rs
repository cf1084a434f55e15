use std::collections::VecDeque;

/// One paced run of spawns. Stored as a counter, not one entry per ball.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Batch {
    next_due: f64,
    remaining: u64,
    delay: f64,
}

impl Batch {
    fn last_due(&self) -> f64 {
        self.next_due + self.remaining.saturating_sub(1) as f64 * self.delay
    }
}

/// Pending spawn due-times, in milliseconds on the simulation clock.
///
/// Batches are paced instead of inserted in one frame: many dynamic bodies
/// dropped at overlapping positions push each other apart violently.
/// Memory is per batch request, whatever the ball count.
#[derive(Debug, Default, Clone)]
pub struct SpawnSchedule {
    batches: VecDeque<Batch>,
}

impl SpawnSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `count` spawns `delay_ms` apart. A batch requested while another
    /// is still pending continues after it rather than interleaving.
    pub fn schedule_batch(&mut self, now_ms: f64, count: u32, delay_ms: f64) {
        if count == 0 {
            return;
        }
        let delay = if delay_ms.is_finite() { delay_ms.max(0.0) } else { 0.0 };
        let start = match self.batches.back() {
            Some(last) => now_ms.max(last.last_due() + delay),
            None => now_ms,
        };
        match self.batches.back_mut() {
            // Same pace, no gap: extend the running batch.
            Some(last) if last.delay == delay && start == last.last_due() + delay => {
                last.remaining = last.remaining.saturating_add(u64::from(count));
            }
            _ => self.batches.push_back(Batch {
                next_due: start,
                remaining: u64::from(count),
                delay,
            }),
        }
        log::debug!(
            "spawn schedule: +{} spawns every {} ms ({} pending)",
            count,
            delay,
            self.pending()
        );
    }

    /// Take one spawn whose due-time has passed. At most one per call, so
    /// a stalled frame never releases a burst.
    pub fn pop_due(&mut self, now_ms: f64) -> bool {
        let Some(front) = self.batches.front_mut() else {
            return false;
        };
        if front.next_due > now_ms {
            return false;
        }
        front.remaining -= 1;
        front.next_due += front.delay;
        if front.remaining == 0 {
            self.batches.pop_front();
        }
        true
    }

    /// Drop every pending spawn. Returns how many were cancelled.
    pub fn cancel(&mut self) -> u64 {
        let n = self.pending();
        self.batches.clear();
        if n > 0 {
            log::debug!("spawn schedule: cancelled {} pending spawns", n);
        }
        n
    }

    pub fn pending(&self) -> u64 {
        self.batches
            .iter()
            .fold(0u64, |n, b| n.saturating_add(b.remaining))
    }

    pub fn next_due(&self) -> Option<f64> {
        self.batches.front().map(|b| b.next_due)
    }
}
