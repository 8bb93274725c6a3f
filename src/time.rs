//! Monotonic simulation clock.
//!
//! The simulation program's `uTime` must never run backwards, so elapsed
//! time is accumulated from non-negative, scaled frame deltas rather than
//! recomputed from wall-clock differences.
//!
//! ```ignore
//! let mut clock = SimClock::new();
//! // once per frame
//! let time = clock.update();
//! driver.tick(time)?;
//! ```

use std::time::{Duration, Instant};

use crate::input::Command;

/// Upper bound for [`Command::SpeedUp`].
pub const MAX_TIME_SCALE: f32 = 8.0;

/// Simulation time source for [`FrameDriver::tick`](crate::FrameDriver::tick).
#[derive(Debug)]
pub struct SimClock {
    /// When the last update occurred.
    last_frame: Instant,
    /// Accumulated simulation seconds.
    elapsed_secs: f32,
    /// Updates since creation.
    frame_count: u64,
    /// Whether time is paused.
    paused: bool,
    /// Fixed delta for deterministic stepping (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            elapsed_secs: 0.0,
            frame_count: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance by the wall-clock time since the last update.
    ///
    /// Returns the new elapsed time.
    pub fn update(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(raw)
    }

    /// Advance by `raw` wall-clock time. Returns the new elapsed time.
    pub fn advance(&mut self, raw: Duration) -> f32 {
        self.frame_count += 1;
        if !self.paused {
            self.elapsed_secs += self.fixed_delta.unwrap_or(raw.as_secs_f32()) * self.time_scale;
        }
        self.elapsed_secs
    }

    /// Simulation seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Use a fixed delta per update instead of wall-clock time.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Set time scale multiplier. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Apply a clock command. Returns `false` for commands meant for the
    /// frame driver.
    pub fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::TogglePause => {
                self.toggle_pause();
                log::info!(
                    "Simulation {} at {:.2}s (frame {})",
                    if self.is_paused() { "paused" } else { "resumed" },
                    self.elapsed(),
                    self.frame()
                );
            }
            Command::SlowDown => {
                self.set_time_scale(self.time_scale() * 0.5);
                log::info!("Time scale {}", self.time_scale());
            }
            Command::SpeedUp => {
                self.set_time_scale((self.time_scale() * 2.0).min(MAX_TIME_SCALE));
                log::info!("Time scale {}", self.time_scale());
            }
            Command::Reset | Command::Nudge(_) => return false,
        }
        true
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
