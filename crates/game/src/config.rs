//! Simulation settings. Loaded from director.ron at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for one headless session. Loaded from `director.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulated session length in seconds.
    #[serde(default = "default_session_seconds")]
    pub session_seconds: f32,
    /// Director ticks per simulated second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: f64,
    /// Upgrade/weapon/encounter catalog. Missing file means built-in catalog.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Where progress is loaded from and saved to.
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
    /// Hostile approach speed, units per second.
    #[serde(default = "default_hostile_speed")]
    pub hostile_speed: f32,
    /// Damage a hostile deals when it reaches the player.
    #[serde(default = "default_contact_damage")]
    pub contact_damage: f32,
    #[serde(default = "default_player_health")]
    pub player_health: f32,
    /// Largest aim error in degrees before assist.
    #[serde(default = "default_aim_jitter")]
    pub aim_jitter_deg: f32,
    /// Seed for the player script. Entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_session_seconds() -> f32 {
    300.0
}
fn default_tick_rate() -> f64 {
    60.0
}
fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog.ron")
}
fn default_save_path() -> PathBuf {
    PathBuf::from("progress.ron")
}
fn default_hostile_speed() -> f32 {
    4.0
}
fn default_contact_damage() -> f32 {
    20.0
}
fn default_player_health() -> f32 {
    100.0
}
fn default_aim_jitter() -> f32 {
    8.0
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            session_seconds: default_session_seconds(),
            tick_rate: default_tick_rate(),
            catalog_path: default_catalog_path(),
            save_path: default_save_path(),
            hostile_speed: default_hostile_speed(),
            contact_damage: default_contact_damage(),
            player_health: default_player_health(),
            aim_jitter_deg: default_aim_jitter(),
            seed: None,
        }
    }
}

impl SimConfig {
    /// Load settings from `director.ron`. If the file is missing or invalid, returns defaults.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid settings at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Write the current settings to `director.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write settings to {:?}: {}", path, e);
            }
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("director.ron")
}
