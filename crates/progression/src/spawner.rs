//! Wave-based hostile spawning.
//!
//! Each wave spawns `round(base * wave_multiplier^(n-1))` hostiles, one at a
//! time, while the live population stays under the cap. Spawned stats scale
//! with both the wave and the current difficulty multiplier. A wave completes
//! once nothing is left to spawn and every hostile it is tracking has been
//! removed; after an intermission the next wave starts on its own.

use std::collections::HashMap;

use engine_core::Countdown;
use glam::Vec3;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::events::GameEvent;

/// Opaque handle the host returns for a spawned hostile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostileHandle(pub u64);

/// Hostile archetypes, lightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostileKind {
    /// Fast, fragile.
    Scout,
    /// Baseline melee hostile.
    Warrior,
    /// Closes distance quickly, hits hard.
    Charger,
    /// Slow heavy with a large health pool.
    Brute,
}

impl HostileKind {
    /// Base health before wave and difficulty scaling.
    pub fn base_health(&self) -> f32 {
        match self {
            HostileKind::Scout => 30.0,
            HostileKind::Warrior => 60.0,
            HostileKind::Charger => 80.0,
            HostileKind::Brute => 200.0,
        }
    }

    /// Credits and XP granted when the player kills one.
    pub fn bounty(&self) -> (u64, u64) {
        match self {
            HostileKind::Scout => (5, 4),
            HostileKind::Warrior => (10, 8),
            HostileKind::Charger => (15, 12),
            HostileKind::Brute => (30, 25),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HostileKind::Scout => "Scout",
            HostileKind::Warrior => "Warrior",
            HostileKind::Charger => "Charger",
            HostileKind::Brute => "Brute",
        }
    }
}

/// What the host is asked to create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: HostileKind,
    pub position: Vec3,
    /// `wave_multiplier^(n-1) * difficulty_multiplier`.
    pub stat_scale: f32,
    pub wave: u32,
}

/// Host side of spawning. The director never touches transforms or physics;
/// it only asks for an entity and keeps the handle.
pub trait EntitySpawner {
    fn spawn(&mut self, request: &SpawnRequest) -> HostileHandle;
}

/// How a hostile left play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Killed by the player: counts toward kill tallies and bounties.
    Killed,
    /// Despawned for any other reason (escaped, culled).
    Despawned,
}

/// Named threat tiers shown on the HUD, driven by combined stat pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    Minimal,
    Moderate,
    Elevated,
    Severe,
    Critical,
    Extinction,
}

impl ThreatLevel {
    pub fn from_pressure(scale: f32) -> Self {
        match scale {
            s if s < 1.0 => ThreatLevel::Minimal,
            s if s < 1.5 => ThreatLevel::Moderate,
            s if s < 2.5 => ThreatLevel::Elevated,
            s if s < 4.0 => ThreatLevel::Severe,
            s if s < 6.0 => ThreatLevel::Critical,
            _ => ThreatLevel::Extinction,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThreatLevel::Minimal => "MINIMAL",
            ThreatLevel::Moderate => "MODERATE",
            ThreatLevel::Elevated => "ELEVATED",
            ThreatLevel::Severe => "SEVERE",
            ThreatLevel::Critical => "CRITICAL",
            ThreatLevel::Extinction => "EXTINCTION",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterConfig {
    #[serde(default = "default_base_enemies")]
    pub base_enemies_per_wave: u32,
    /// Growth of enemy count and stats per wave.
    #[serde(default = "default_wave_multiplier")]
    pub wave_multiplier: f32,
    /// Most hostiles alive at once.
    #[serde(default = "default_population_cap")]
    pub population_cap: usize,
    /// Seconds between individual spawns.
    #[serde(default = "default_spawn_cooldown")]
    pub spawn_cooldown: f32,
    /// Seconds between a wave completing and the next one starting.
    #[serde(default = "default_intermission")]
    pub intermission: f32,
    /// Seconds before wave 1 once the encounter begins.
    #[serde(default = "default_first_wave_delay")]
    pub first_wave_delay: f32,
    /// Completion reward per wave number.
    #[serde(default = "default_completion_credits")]
    pub completion_credits_per_wave: u64,
    #[serde(default = "default_completion_xp")]
    pub completion_xp_per_wave: u64,
    #[serde(default = "default_min_spawn_distance")]
    pub min_spawn_distance: f32,
    #[serde(default = "default_max_spawn_distance")]
    pub max_spawn_distance: f32,
    /// Fixed RNG seed for reproducible sessions; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_base_enemies() -> u32 {
    5
}
fn default_wave_multiplier() -> f32 {
    1.2
}
fn default_population_cap() -> usize {
    12
}
fn default_spawn_cooldown() -> f32 {
    1.5
}
fn default_intermission() -> f32 {
    10.0
}
fn default_first_wave_delay() -> f32 {
    3.0
}
fn default_completion_credits() -> u64 {
    50
}
fn default_completion_xp() -> u64 {
    25
}
fn default_min_spawn_distance() -> f32 {
    18.0
}
fn default_max_spawn_distance() -> f32 {
    55.0
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            base_enemies_per_wave: default_base_enemies(),
            wave_multiplier: default_wave_multiplier(),
            population_cap: default_population_cap(),
            spawn_cooldown: default_spawn_cooldown(),
            intermission: default_intermission(),
            first_wave_delay: default_first_wave_delay(),
            completion_credits_per_wave: default_completion_credits(),
            completion_xp_per_wave: default_completion_xp(),
            min_spawn_distance: default_min_spawn_distance(),
            max_spawn_distance: default_max_spawn_distance(),
            seed: None,
        }
    }
}

impl EncounterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| Err(ConfigError::InvalidEncounter(reason.to_string()));
        if !(self.wave_multiplier > 0.0) || !self.wave_multiplier.is_finite() {
            return invalid("wave_multiplier must be positive");
        }
        if self.population_cap == 0 {
            return invalid("population_cap must be at least 1");
        }
        if !(self.spawn_cooldown >= 0.0)
            || !(self.intermission >= 0.0)
            || !(self.first_wave_delay >= 0.0)
        {
            return invalid("timers must not be negative");
        }
        if !(self.min_spawn_distance >= 0.0)
            || !(self.max_spawn_distance >= self.min_spawn_distance)
        {
            return invalid("spawn distances must satisfy 0 <= min <= max");
        }
        Ok(())
    }

    /// `round(base * wave_multiplier^(wave-1))`.
    pub fn enemies_for_wave(&self, wave: u32) -> u32 {
        (self.base_enemies_per_wave as f32 * self.wave_scale(wave)).round() as u32
    }

    /// `wave_multiplier^(wave-1)`.
    pub fn wave_scale(&self, wave: u32) -> f32 {
        self.wave_multiplier.powi(wave.saturating_sub(1) as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveState {
    Inactive,
    Active,
    Complete,
}

/// Reward for clearing a wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveReward {
    pub wave: u32,
    pub credits: u64,
    pub xp: u64,
}

/// The wave currently being fought (or just finished).
#[derive(Debug, Clone)]
pub struct Wave {
    number: u32,
    remaining_to_spawn: u32,
    live: HashMap<HostileHandle, HostileKind>,
    kills: u32,
    state: WaveState,
}

impl Wave {
    fn inactive() -> Self {
        Self {
            number: 0,
            remaining_to_spawn: 0,
            live: HashMap::new(),
            kills: 0,
            state: WaveState::Inactive,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn remaining_to_spawn(&self) -> u32 {
        self.remaining_to_spawn
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: HostileHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn state(&self) -> WaveState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_to_spawn == 0 && self.live.is_empty()
    }
}

/// Spawns hostiles wave by wave and tracks their removal.
pub struct EncounterDirector {
    config: EncounterConfig,
    wave: Wave,
    spawn_cooldown: Countdown,
    /// Time until the next wave starts, while one is scheduled.
    next_wave: Option<Countdown>,
    total_kills: u32,
    threat_level: ThreatLevel,
    rng: StdRng,
}

impl EncounterDirector {
    pub fn new(config: EncounterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            wave: Wave::inactive(),
            spawn_cooldown: Countdown::finished(),
            next_wave: None,
            total_kills: 0,
            threat_level: ThreatLevel::Minimal,
            rng,
        }
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn wave(&self) -> &Wave {
        &self.wave
    }

    pub fn wave_number(&self) -> u32 {
        self.wave.number
    }

    pub fn state(&self) -> WaveState {
        self.wave.state
    }

    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    pub fn threat_level(&self) -> ThreatLevel {
        self.threat_level
    }

    /// Seconds until the next wave, if one is scheduled.
    pub fn time_until_next_wave(&self) -> Option<f32> {
        self.next_wave.map(|c| c.remaining())
    }

    /// Schedule wave 1 after the configured delay.
    pub fn begin(&mut self) {
        if self.wave.number == 0 && self.next_wave.is_none() {
            self.next_wave = Some(Countdown::new(self.config.first_wave_delay));
        }
    }

    /// Start wave `n` immediately. Hostiles still alive from the previous
    /// wave carry over and must be cleared before this one completes.
    pub fn start_wave(&mut self, n: u32, events: &mut Vec<GameEvent>) {
        let n = n.max(1);
        let enemies = self.config.enemies_for_wave(n);
        let carried = std::mem::take(&mut self.wave.live);
        self.wave = Wave {
            number: n,
            remaining_to_spawn: enemies,
            live: carried,
            kills: 0,
            state: WaveState::Active,
        };
        self.spawn_cooldown = Countdown::finished();
        self.next_wave = None;
        log::info!("Wave {} started: {} hostiles", n, enemies);
        events.push(GameEvent::WaveStarted { wave: n, enemies });
    }

    /// Advance one tick. Returns the completion reward on the tick a wave completes.
    pub fn update(
        &mut self,
        dt: f32,
        difficulty: f32,
        anchor: Vec3,
        spawner: &mut dyn EntitySpawner,
        events: &mut Vec<GameEvent>,
    ) -> Option<WaveReward> {
        let pressure = self.config.wave_scale(self.wave.number.max(1)) * difficulty;
        self.threat_level = ThreatLevel::from_pressure(pressure);

        match self.wave.state {
            WaveState::Inactive | WaveState::Complete => {
                if let Some(timer) = self.next_wave.as_mut() {
                    if timer.tick(dt) {
                        let next = self.wave.number + 1;
                        self.start_wave(next, events);
                    }
                }
                None
            }
            WaveState::Active => {
                self.spawn_cooldown.tick(dt);
                if self.wave.live.len() < self.config.population_cap
                    && self.wave.remaining_to_spawn > 0
                    && self.spawn_cooldown.is_finished()
                {
                    self.spawn_one(difficulty, anchor, spawner, events);
                }
                self.check_completion(events)
            }
        }
    }

    fn spawn_one(
        &mut self,
        difficulty: f32,
        anchor: Vec3,
        spawner: &mut dyn EntitySpawner,
        events: &mut Vec<GameEvent>,
    ) {
        let request = SpawnRequest {
            kind: self.random_kind(),
            position: self.random_position(anchor),
            stat_scale: self.config.wave_scale(self.wave.number) * difficulty,
            wave: self.wave.number,
        };
        let handle = spawner.spawn(&request);
        self.wave.remaining_to_spawn -= 1;
        if self.wave.live.insert(handle, request.kind).is_some() {
            log::warn!("Spawner reused live handle {:?}", handle);
        }
        self.spawn_cooldown.reset(self.config.spawn_cooldown);
        events.push(GameEvent::HostileSpawned {
            handle,
            kind: request.kind,
            stat_scale: request.stat_scale,
        });
    }

    fn check_completion(&mut self, events: &mut Vec<GameEvent>) -> Option<WaveReward> {
        if self.wave.state != WaveState::Active || !self.wave.is_complete() {
            return None;
        }
        let n = self.wave.number;
        self.wave.state = WaveState::Complete;
        self.next_wave = Some(Countdown::new(self.config.intermission));
        log::info!("Wave {} complete ({} kills)", n, self.wave.kills);
        events.push(GameEvent::WaveCompleted { wave: n });
        Some(WaveReward {
            wave: n,
            credits: self.config.completion_credits_per_wave * n as u64,
            xp: self.config.completion_xp_per_wave * n as u64,
        })
    }

    /// Death / despawn callback from the host. Returns the kind when a tracked
    /// hostile was killed; unknown handles are ignored.
    pub fn on_hostile_removed(
        &mut self,
        handle: HostileHandle,
        cause: RemovalCause,
    ) -> Option<HostileKind> {
        let Some(kind) = self.wave.live.remove(&handle) else {
            log::warn!("Removal reported for untracked hostile {:?}", handle);
            return None;
        };
        match cause {
            RemovalCause::Killed => {
                self.wave.kills += 1;
                self.total_kills += 1;
                Some(kind)
            }
            RemovalCause::Despawned => None,
        }
    }

    /// Kind selection: light hostiles early, heavier mix as waves climb.
    fn random_kind(&mut self) -> HostileKind {
        let wave = self.wave.number;
        let roll = self.rng.gen::<f32>();
        if wave < 3 {
            if roll < 0.6 { HostileKind::Scout } else { HostileKind::Warrior }
        } else if wave < 6 {
            if roll < 0.35 { HostileKind::Scout }
            else if roll < 0.75 { HostileKind::Warrior }
            else { HostileKind::Charger }
        } else if wave < 10 {
            if roll < 0.2 { HostileKind::Scout }
            else if roll < 0.55 { HostileKind::Warrior }
            else if roll < 0.85 { HostileKind::Charger }
            else { HostileKind::Brute }
        } else {
            if roll < 0.1 { HostileKind::Scout }
            else if roll < 0.4 { HostileKind::Warrior }
            else if roll < 0.7 { HostileKind::Charger }
            else { HostileKind::Brute }
        }
    }

    /// Point on a ring around `anchor` between the min and max spawn distance.
    fn random_position(&mut self, anchor: Vec3) -> Vec3 {
        let angle = self.rng.gen::<f32>() * std::f32::consts::TAU;
        let span = self.config.max_spawn_distance - self.config.min_spawn_distance;
        let dist = self.config.min_spawn_distance + self.rng.gen::<f32>() * span;
        anchor + Vec3::new(angle.cos() * dist, 0.0, angle.sin() * dist)
    }
}
