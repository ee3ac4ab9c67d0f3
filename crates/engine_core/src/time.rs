//! Time management for the game loop.

use std::time::{Duration, Instant};

/// Manages frame timing and delta time calculation.
#[derive(Debug)]
pub struct Time {
    /// Time of the last frame.
    last_frame: Instant,
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Update timing at the start of a new frame from the wall clock.
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_frame;
        self.last_frame = now;
        self.advance(delta);
    }

    /// Advance by an explicit frame delta (headless runs and tests).
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the delta time as a Duration.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get total elapsed time as Duration.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-step accounting with a hard cap on sub-steps per outer tick.
///
/// Time left over after the cap is hit is dropped rather than carried into the
/// next tick, so a long frame hitch costs simulation fidelity instead of an
/// unbounded catch-up burst.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step,
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    /// Accumulate `elapsed` seconds and return how many fixed steps to run now.
    pub fn consume(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed.max(0.0);
        let available = (self.accumulator / self.step).floor() as u32;
        let steps = available.min(self.max_substeps);
        if available > self.max_substeps {
            log::debug!(
                "fixed step capped at {} sub-steps, dropping {:.4}s",
                self.max_substeps,
                self.accumulator - steps as f32 * self.step
            );
            self.accumulator = 0.0;
        } else {
            self.accumulator -= steps as f32 * self.step;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_step_carries_remainder_below_cap() {
        let mut fixed = FixedTimestep::new(1.0 / 60.0, 3);
        assert_eq!(fixed.consume(0.01), 0);
        // 0.01 + 0.01 crosses one step.
        assert_eq!(fixed.consume(0.01), 1);
    }

    #[test]
    fn fixed_step_drops_excess_after_cap() {
        let mut fixed = FixedTimestep::new(1.0 / 60.0, 3);
        assert_eq!(fixed.consume(0.5), 3);
        // Nothing from the hitch survives into the next tick.
        assert_eq!(fixed.consume(0.0), 0);
        assert_eq!(fixed.consume(1.0 / 60.0 + 1e-4), 1);
    }

    #[test]
    fn advance_accumulates_elapsed() {
        let mut time = Time::new();
        time.advance(Duration::from_millis(16));
        time.advance(Duration::from_millis(16));
        assert_eq!(time.frame_count(), 2);
        assert_eq!(time.elapsed(), Duration::from_millis(32));
        assert!((time.delta_seconds() - 0.016).abs() < 1e-6);
    }
}
