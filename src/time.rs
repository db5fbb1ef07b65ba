//! Frame timing.
//!
//! One source of truth for `delta_time`, which every species' dispatch in
//! a frame shares. A fixed delta can be pinned for deterministic runs.

use std::time::{Duration, Instant};

/// Time tracking for the frame driver.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    fixed_delta: Option<f32>,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            fixed_delta: None,
        }
    }

    /// Update timing values. Call once per frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_secs = match self.fixed_delta {
            Some(dt) => dt,
            None => now.duration_since(self.last_frame).as_secs_f32(),
        };
        self.last_frame = now;
        self.frame_count += 1;

        let since_fps = now.duration_since(self.fps_update_time);
        if since_fps >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since_fps.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }
    }

    /// Seconds since the last frame (or the pinned fixed delta).
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Seconds since the tracker was created.
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Pin every frame to a fixed delta; `None` returns to wall-clock time.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delta_overrides_wall_clock() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(0.016));
        time.update();
        time.update();
        assert_eq!(time.delta(), 0.016);
        assert_eq!(time.frame(), 2);
    }

    #[test]
    fn delta_is_non_negative() {
        let mut time = Time::new();
        time.update();
        assert!(time.delta() >= 0.0);
    }
}
