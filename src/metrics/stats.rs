use std::time::{Duration, Instant};

/// Default FPS reporting interval.
pub const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Counts draws and yields an integer frame rate once per reporting
/// interval.
pub struct FpsCounter {
    interval: Duration,
    frames: u32,
    window_start: Instant,
}

impl FpsCounter {
    /// Create a counter with the default one-second reporting interval.
    pub fn new() -> Self {
        Self::with_interval(REPORT_INTERVAL)
    }

    /// Create a counter with a custom reporting interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            frames: 0,
            window_start: Instant::now(),
        }
    }

    /// Record one drawn frame. Returns the measured FPS when the current
    /// reporting window has elapsed, `None` otherwise.
    pub fn tick(&mut self) -> Option<u32> {
        self.frames += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed < self.interval {
            return None;
        }
        let fps = (f64::from(self.frames) / elapsed.as_secs_f64()).round() as u32;
        self.frames = 0;
        self.window_start = Instant::now();
        Some(fps)
    }

    /// Frames counted in the current window.
    pub fn frames_in_window(&self) -> u32 {
        self.frames
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
