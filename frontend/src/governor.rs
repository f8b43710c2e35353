use std::time::{Duration, Instant};

/// Real-time frame pacing.
///
/// Holds back the next frame until its slot on a fixed schedule. When the
/// emulator falls more than a frame behind, the schedule restarts from now
/// instead of running a burst of catch-up frames.
pub struct Governor {
    frame: Duration,
    next: Option<Instant>,
}

impl Governor {
    pub fn new(frame_rate_hz: f64) -> Self {
        let rate = if frame_rate_hz.is_finite() && frame_rate_hz > 0.0 {
            frame_rate_hz
        } else {
            60.0
        };
        Self {
            frame: Duration::from_secs_f64(1.0 / rate),
            next: None,
        }
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame
    }

    /// Advance the schedule by one frame and return how long to wait at `now`.
    pub fn pace(&mut self, now: Instant) -> Duration {
        let target = match self.next {
            Some(next) if now.saturating_duration_since(next) <= self.frame => next,
            _ => now,
        };
        self.next = Some(target + self.frame);
        target.saturating_duration_since(now)
    }

    /// Sleep until the current frame's slot.
    pub fn wait(&mut self) {
        let delay = self.pace(Instant::now());
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    /// Forget the schedule, e.g. after sitting in the debugger.
    pub fn resync(&mut self) {
        self.next = None;
    }
}
