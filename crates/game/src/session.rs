//! Scripted headless play session driving the combat director.

use std::cell::RefCell;
use std::rc::Rc;

use engine_core::{Health, Time};
use glam::{Quat, Vec3};
use progression::{
    Catalog, CombatDirector, ConfigError, FireOutcome, GameEvent, HostileHandle, StatKey, StatSink,
    WaveState,
};
use rand::prelude::*;

use crate::config::SimConfig;
use crate::world::HostileWorld;

/// Length of one simulated render frame.
const FRAME_SECONDS: f32 = 1.0 / 30.0;
const PLAYER_EYE: Vec3 = Vec3::new(0.0, 1.7, 0.0);
/// Half-angle within which a shot counts as a hit.
const HIT_CONE_DEG: f32 = 5.0;

/// Logs stat changes the way a HUD would pick them up.
struct HudSink;

impl StatSink for HudSink {
    fn publish(&mut self, stat: StatKey, multiplier: f32) {
        log::debug!("stat {} -> x{:.2}", stat, multiplier);
    }
}

/// Counters collected from director events.
#[derive(Debug, Default, Clone)]
pub struct SessionStats {
    pub shots: u32,
    pub hits: u32,
    pub reloads: u32,
    pub overheats: u32,
    pub waves_completed: u32,
    pub upgrades_bought: u32,
    pub level_ups: u32,
    pub player_deaths: u32,
    pub credits_earned: u64,
}

fn record(stats: &mut SessionStats, event: &GameEvent) {
    match event {
        GameEvent::WeaponFired { .. } => stats.shots += 1,
        GameEvent::ReloadStarted { .. } => stats.reloads += 1,
        GameEvent::Overheated { weapon, .. } => {
            stats.overheats += 1;
            log::debug!("{} overheated", weapon);
        }
        GameEvent::WaveCompleted { .. } => stats.waves_completed += 1,
        GameEvent::UpgradePurchased { .. } => stats.upgrades_bought += 1,
        GameEvent::UpgradeMaxed { id } => log::info!("{} maxed out", id),
        GameEvent::LevelUp { .. } => stats.level_ups += 1,
        GameEvent::RewardGranted { credits, .. } => stats.credits_earned += credits,
        _ => {}
    }
}

pub struct Session {
    pub director: CombatDirector,
    world: HostileWorld,
    player: Health,
    rng: StdRng,
    config: SimConfig,
    stats: Rc<RefCell<SessionStats>>,
    last_wave: u32,
}

impl Session {
    pub fn new(config: SimConfig, catalog: Catalog) -> Result<Self, ConfigError> {
        let mut director = CombatDirector::new(catalog, HudSink)?;
        let stats = Rc::new(RefCell::new(SessionStats::default()));
        let counters = stats.clone();
        director.subscribe(move |event: &GameEvent| record(&mut counters.borrow_mut(), event));

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            director,
            world: HostileWorld::new(),
            player: Health::new(config.player_health),
            rng,
            config,
            stats,
            last_wave: 0,
        })
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.borrow().clone()
    }

    pub fn hostiles_alive(&self) -> usize {
        self.world.len()
    }

    /// Run for the configured session length.
    pub fn run(&mut self) {
        let mut time = Time::new();
        time.set_fixed_rate(self.config.tick_rate);
        let step = time.fixed_timestep_seconds();

        self.director.start();
        while time.elapsed_seconds() < self.config.session_seconds {
            time.advance(FRAME_SECONDS);
            while time.should_fixed_update() {
                self.step(step);
            }
        }
        log::info!(
            "Session over after {} frames: wave {}, threat {}",
            time.frame_count(),
            self.director.encounter().wave_number(),
            self.director.encounter().threat_level().name()
        );
    }

    fn step(&mut self, dt: f32) {
        self.director.tick(dt, Vec3::ZERO, &mut self.world);

        let wave = self.director.encounter().wave_number();
        if wave != self.last_wave {
            self.last_wave = wave;
            self.rotate_weapon();
        }

        for handle in self.world.advance(dt, Vec3::ZERO, self.config.hostile_speed) {
            self.director.on_hostile_despawned(handle);
            self.take_contact_hit();
        }

        let hostiles = self.world.positions();
        if hostiles.is_empty() {
            if self.director.encounter().state() != WaveState::Active {
                self.shop();
                let active = self.director.loadout().active();
                if active.ammo() < active.max_ammo() && !active.is_reloading() {
                    self.director.request_reload();
                }
            }
            return;
        }
        self.fire_at_nearest(&hostiles);
    }

    fn take_contact_hit(&mut self) {
        self.player.take_damage(self.config.contact_damage);
        if self.player.is_dead() {
            self.director.on_player_died();
            self.stats.borrow_mut().player_deaths += 1;
            self.player = Health::new(self.config.player_health);
        }
    }

    fn rotate_weapon(&mut self) {
        let slots = self.director.loadout().slots().len();
        let next = (self.director.loadout().active_slot() + 1) % slots;
        if let Err(denied) = self.director.switch_weapon(next) {
            log::debug!("Weapon switch to slot {} denied: {:?}", next, denied);
        }
    }

    fn fire_at_nearest(&mut self, hostiles: &[(HostileHandle, Vec3)]) {
        let Some(&(_, target)) = hostiles.iter().min_by(|a, b| {
            let da = a.1.distance_squared(PLAYER_EYE);
            da.total_cmp(&b.1.distance_squared(PLAYER_EYE))
        }) else {
            return;
        };
        let aim = self.jitter((target - PLAYER_EYE).normalize_or_zero());
        if let FireOutcome::Fired(shot) = self.director.request_fire(PLAYER_EYE, aim, hostiles) {
            if let Some(hit) = resolve_hit(PLAYER_EYE, shot.direction, hostiles) {
                self.stats.borrow_mut().hits += 1;
                if self.world.damage(hit, shot.damage) {
                    if let Some(kind) = self.director.on_hostile_died(hit) {
                        log::debug!("Killed {}", kind.name());
                    }
                }
            }
        }
    }

    fn jitter(&mut self, aim: Vec3) -> Vec3 {
        let max = self.config.aim_jitter_deg.to_radians();
        if max <= 0.0 || aim == Vec3::ZERO {
            return aim;
        }
        let random = Vec3::new(
            self.rng.gen_range(-1.0..1.0),
            self.rng.gen_range(-1.0..1.0),
            self.rng.gen_range(-1.0..1.0),
        );
        let axis = aim.cross(random).normalize_or_zero();
        if axis == Vec3::ZERO {
            return aim;
        }
        Quat::from_axis_angle(axis, self.rng.gen_range(0.0..=max)) * aim
    }

    /// Buy the cheapest affordable upgrade until nothing else is affordable.
    fn shop(&mut self) {
        loop {
            let upgrades = self.director.upgrades();
            let pick = upgrades
                .nodes()
                .filter(|n| self.director.can_purchase(n.id()))
                .min_by_key(|n| upgrades.next_cost(n.id()).unwrap_or(u64::MAX))
                .map(|n| n.id().to_string());
            let Some(id) = pick else { break };
            if let Err(denied) = self.director.purchase(&id) {
                log::warn!("Shop purchase of {} failed: {}", id, denied);
                break;
            }
        }
    }
}

fn resolve_hit(
    origin: Vec3,
    direction: Vec3,
    hostiles: &[(HostileHandle, Vec3)],
) -> Option<HostileHandle> {
    let cone = HIT_CONE_DEG.to_radians();
    hostiles
        .iter()
        .filter_map(|&(handle, pos)| {
            let to = pos - origin;
            let distance = to.length();
            if distance <= f32::EPSILON {
                return Some((handle, 0.0));
            }
            (direction.angle_between(to) <= cone).then_some((handle, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}
