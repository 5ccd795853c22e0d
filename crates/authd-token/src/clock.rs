use std::time::Instant;

/// A monotonic seconds counter anchored to process start. Token expirations
/// are stored relative to this clock rather than wall-clock time so they are
/// immune to clock jumps (NTP steps, DST, operator clock changes).
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_seconds(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}
