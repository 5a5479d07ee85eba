//! Adaptive difficulty: a slowly drifting performance rating driven by recent
//! kills and deaths, mapped onto an enemy stat multiplier.

use std::collections::VecDeque;

use engine_core::clamp_seconds;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyConfig {
    /// Multiplier at rating 0.
    #[serde(default = "default_low_bound")]
    pub low_bound: f32,
    /// Multiplier at rating 1.
    #[serde(default = "default_high_bound")]
    pub high_bound: f32,
    #[serde(default = "default_initial_rating")]
    pub initial_rating: f32,
    /// Largest rating change per second.
    #[serde(default = "default_adjust_rate")]
    pub adjust_rate: f32,
    /// Length of the rolling outcome window, seconds.
    #[serde(default = "default_window")]
    pub window_seconds: f32,
    /// K/D ratio above which (with a streak) the player is dominating.
    #[serde(default = "default_dominant_ratio")]
    pub dominant_ratio: f32,
    /// K/D ratio below which the player is struggling.
    #[serde(default = "default_struggling_ratio")]
    pub struggling_ratio: f32,
    /// Streak that must be exceeded before the rating climbs.
    #[serde(default = "default_streak_threshold")]
    pub streak_threshold: u32,
}

fn default_low_bound() -> f32 {
    0.5
}
fn default_high_bound() -> f32 {
    2.0
}
fn default_initial_rating() -> f32 {
    0.5
}
fn default_adjust_rate() -> f32 {
    0.02
}
fn default_window() -> f32 {
    60.0
}
fn default_dominant_ratio() -> f32 {
    2.0
}
fn default_struggling_ratio() -> f32 {
    0.5
}
fn default_streak_threshold() -> u32 {
    5
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            low_bound: default_low_bound(),
            high_bound: default_high_bound(),
            initial_rating: default_initial_rating(),
            adjust_rate: default_adjust_rate(),
            window_seconds: default_window(),
            dominant_ratio: default_dominant_ratio(),
            struggling_ratio: default_struggling_ratio(),
            streak_threshold: default_streak_threshold(),
        }
    }
}

impl DifficultyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| Err(ConfigError::InvalidDifficulty(reason.to_string()));
        if !(self.low_bound > 0.0)
            || !(self.high_bound >= self.low_bound)
            || !self.high_bound.is_finite()
        {
            return invalid("bounds must satisfy 0 < low_bound <= high_bound");
        }
        if !(0.0..=1.0).contains(&self.initial_rating) {
            return invalid("initial_rating must be in [0, 1]");
        }
        if !(self.adjust_rate >= 0.0) || !self.adjust_rate.is_finite() {
            return invalid("adjust_rate must be a non-negative number");
        }
        if !(self.window_seconds > 0.0) {
            return invalid("window_seconds must be positive");
        }
        if !(self.struggling_ratio < self.dominant_ratio) {
            return invalid("struggling_ratio must be below dominant_ratio");
        }
        Ok(())
    }
}

/// Which way the rating is currently being pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Kill,
    Death,
}

/// Rolling combat-performance signal and the difficulty multiplier derived from it.
#[derive(Debug, Clone)]
pub struct DifficultyGovernor {
    config: DifficultyConfig,
    rating: f32,
    /// Seconds since creation. Kept in f64 so long sessions still advance.
    clock: f64,
    outcomes: VecDeque<(f64, Outcome)>,
    streak: u32,
    total_kills: u32,
    total_deaths: u32,
}

impl DifficultyGovernor {
    pub fn new(config: DifficultyConfig) -> Self {
        let rating = config.initial_rating.clamp(0.0, 1.0);
        Self {
            config,
            rating,
            clock: 0.0,
            outcomes: VecDeque::new(),
            streak: 0,
            total_kills: 0,
            total_deaths: 0,
        }
    }

    pub fn record_kill(&mut self) {
        self.outcomes.push_back((self.clock, Outcome::Kill));
        self.streak += 1;
        self.total_kills += 1;
    }

    pub fn record_player_death(&mut self) {
        self.outcomes.push_back((self.clock, Outcome::Death));
        self.streak = 0;
        self.total_deaths += 1;
    }

    /// Kills over deaths inside the window (deaths floored at 1).
    /// `None` when nothing happened recently.
    pub fn kill_death_ratio(&self) -> Option<f32> {
        if self.outcomes.is_empty() {
            return None;
        }
        let kills = self.outcomes.iter().filter(|(_, o)| *o == Outcome::Kill).count();
        let deaths = self.outcomes.len() - kills;
        Some(kills as f32 / deaths.max(1) as f32)
    }

    pub fn trend(&self) -> Trend {
        match self.kill_death_ratio() {
            Some(r)
                if r > self.config.dominant_ratio && self.streak > self.config.streak_threshold =>
            {
                Trend::Rising
            }
            Some(r) if r < self.config.struggling_ratio => Trend::Falling,
            _ => Trend::Steady,
        }
    }

    /// Advance the clock, expire old outcomes and nudge the rating by at most
    /// `adjust_rate * dt`.
    pub fn update(&mut self, dt: f32) {
        let dt = clamp_seconds("difficulty tick delta", dt);
        self.clock += f64::from(dt);
        let horizon = self.clock - f64::from(self.config.window_seconds);
        while self.outcomes.front().is_some_and(|(t, _)| *t < horizon) {
            self.outcomes.pop_front();
        }

        let step = self.config.adjust_rate * dt;
        let before = self.rating;
        match self.trend() {
            Trend::Rising => self.rating += step,
            Trend::Falling => self.rating -= step,
            Trend::Steady => {}
        }
        self.rating = self.rating.clamp(0.0, 1.0);
        if (self.rating * 10.0).floor() != (before * 10.0).floor() {
            log::info!(
                "Difficulty rating {:.2} -> {:.2} (x{:.2})",
                before,
                self.rating,
                self.multiplier()
            );
        }
    }

    /// Performance rating in [0, 1].
    pub fn rating(&self) -> f32 {
        self.rating
    }

    /// `low + rating * (high - low)`.
    pub fn multiplier(&self) -> f32 {
        self.config.low_bound + self.rating * (self.config.high_bound - self.config.low_bound)
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    pub fn total_deaths(&self) -> u32 {
        self.total_deaths
    }
}
