//! Time management for the simulation loop.

use std::time::Duration;

/// Frame clock driven by externally supplied deltas.
///
/// The host decides how long each tick was (wall clock, replay, or a fixed
/// script); this type only accumulates it and hands out fixed steps.
#[derive(Debug)]
pub struct Time {
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Fixed timestep for the director tick (default 60 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new clock at t = 0.
    pub fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
        }
    }

    /// Advance the clock by one frame of `seconds`. Negative or non-finite
    /// deltas are treated as zero.
    pub fn advance(&mut self, seconds: f32) {
        let seconds = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            if seconds != 0.0 {
                log::warn!("Ignoring invalid frame delta {}", seconds);
            }
            0.0
        };
        self.delta = Duration::from_secs_f32(seconds);
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.accumulator += self.delta;
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        if hz > 0.0 {
            self.fixed_timestep = Duration::from_secs_f64(1.0 / hz);
        }
    }
}

/// Monotonic countdown stored as remaining seconds.
///
/// Ticking subtracts elapsed time, never a tick count, so variable frame
/// lengths are handled uniformly. Remaining time never goes below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// Start a countdown. A negative or non-finite duration is clamped to zero.
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: clamp_seconds("countdown duration", seconds),
        }
    }

    /// A countdown that is already finished.
    pub fn finished() -> Self {
        Self { remaining: 0.0 }
    }

    /// Subtract `dt` seconds. Returns true once the countdown has reached zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        let dt = clamp_seconds("countdown tick delta", dt);
        self.remaining = (self.remaining - dt).max(0.0);
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Restart with a new duration.
    pub fn reset(&mut self, seconds: f32) {
        self.remaining = clamp_seconds("countdown duration", seconds);
    }
}

/// `seconds` if it is a finite, non-negative duration; otherwise zero, with a
/// warning naming `what`.
pub fn clamp_seconds(what: &str, seconds: f32) -> f32 {
    if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        log::warn!("Clamping invalid {} {} to zero", what, seconds);
        0.0
    }
}
