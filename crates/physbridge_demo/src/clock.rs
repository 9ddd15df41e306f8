//! Frame clock for the headless loop

use std::time::Instant;

/// Hands out a fixed simulated delta per frame while tracking real time
pub struct FrameClock {
    started: Instant,
    frame_delta: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameClock {
    /// Advance `frame_delta` simulated seconds per tick
    pub fn fixed(frame_delta: f32) -> Self {
        Self {
            started: Instant::now(),
            frame_delta,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Start the next frame and return its delta in seconds
    pub fn tick(&mut self) -> f32 {
        self.total_time += self.frame_delta;
        self.frame_count += 1;
        self.frame_delta
    }

    /// Simulated seconds since the clock started
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Frames started so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Wall-clock seconds since the clock started
    pub fn real_elapsed(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_ticks_accumulate() {
        let mut clock = FrameClock::fixed(0.25);
        assert_relative_eq!(clock.tick(), 0.25);
        clock.tick();
        assert_eq!(clock.frame_count(), 2);
        assert_relative_eq!(clock.total_time(), 0.5);
    }
}
