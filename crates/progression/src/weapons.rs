//! Weapon fire control: ammo, heat, reload and fire-rate gating per slot.

use std::fmt;

use engine_core::{clamp_seconds, Countdown};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SwitchDenied};
use crate::events::GameEvent;
use crate::spawner::HostileHandle;
use crate::stats::{StatKey, WeaponStat};
use crate::targeting::{assist_aim, AssistConfig};

/// Slack for comparing the shot timer against the fire interval, so a timer
/// built from many float deltas is not rejected by rounding error.
const FIRE_INTERVAL_EPSILON: f32 = 1e-4;

/// Weapon types available to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    /// Standard assault rifle - high fire rate, medium damage.
    Rifle,
    /// Shotgun - slow, high damage up close.
    Shotgun,
    /// Sniper - slow, high damage, long range.
    Sniper,
    /// Rocket launcher - single round, heavy.
    Rocket,
    /// Flamethrower - continuous, runs hot.
    Flamethrower,
    /// Machine gun - high rate, large magazine, heat limited.
    MachineGun,
}

impl WeaponType {
    /// Identifier used in stat names.
    pub fn key(&self) -> &'static str {
        match self {
            WeaponType::Rifle => "rifle",
            WeaponType::Shotgun => "shotgun",
            WeaponType::Sniper => "sniper",
            WeaponType::Rocket => "rocket",
            WeaponType::Flamethrower => "flamethrower",
            WeaponType::MachineGun => "machineGun",
        }
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Static tuning for one weapon type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponConfig {
    pub weapon_type: WeaponType,
    pub damage: f32,
    /// Shots per second before upgrades.
    pub fire_rate: f32,
    pub max_ammo: u32,
    pub reload_time: f32,
    pub max_heat: f32,
    pub heat_per_shot: f32,
    /// Heat at which the weapon locks out.
    pub overheat_threshold: f32,
    /// Fraction of `max_heat` the weapon must cool to before it fires again.
    #[serde(default = "default_resume_fraction")]
    pub resume_fraction: f32,
    /// Heat removed per second, in every state.
    pub heat_dissipation: f32,
    #[serde(default)]
    pub assist: AssistConfig,
}

fn default_resume_fraction() -> f32 {
    0.3
}

impl WeaponConfig {
    pub fn new(weapon_type: WeaponType) -> Self {
        let (damage, fire_rate, max_ammo, reload_time, heat_per_shot, overheat, dissipation) =
            match weapon_type {
                WeaponType::Rifle => (25.0, 10.0, 30, 2.0, 4.0, 90.0, 25.0),
                WeaponType::Shotgun => (15.0, 1.5, 8, 2.5, 15.0, 90.0, 20.0),
                WeaponType::Sniper => (150.0, 0.8, 5, 3.0, 30.0, 95.0, 15.0),
                WeaponType::Rocket => (200.0, 0.5, 1, 3.5, 40.0, 95.0, 10.0),
                WeaponType::Flamethrower => (5.0, 30.0, 100, 2.0, 3.0, 85.0, 30.0),
                WeaponType::MachineGun => (18.0, 18.0, 200, 4.0, 3.0, 90.0, 20.0),
            };
        Self {
            weapon_type,
            damage,
            fire_rate,
            max_ammo,
            reload_time,
            max_heat: 100.0,
            heat_per_shot,
            overheat_threshold: overheat,
            resume_fraction: default_resume_fraction(),
            heat_dissipation: dissipation,
            assist: AssistConfig::default(),
        }
    }

    pub fn resume_heat(&self) -> f32 {
        self.max_heat * self.resume_fraction
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidWeapon {
            weapon: self.weapon_type,
            reason: reason.to_string(),
        };
        if !(self.fire_rate > 0.0) || !self.fire_rate.is_finite() {
            return Err(invalid("fire_rate must be positive"));
        }
        if self.max_ammo == 0 {
            return Err(invalid("max_ammo must be at least 1"));
        }
        if !(self.reload_time >= 0.0) {
            return Err(invalid("reload_time must not be negative"));
        }
        if !(self.max_heat > 0.0) {
            return Err(invalid("max_heat must be positive"));
        }
        if !(self.heat_per_shot >= 0.0) || !(self.heat_dissipation >= 0.0) {
            return Err(invalid("heat rates must not be negative"));
        }
        if !(self.overheat_threshold > 0.0) || self.overheat_threshold > self.max_heat {
            return Err(invalid("overheat_threshold must be in (0, max_heat]"));
        }
        if !(self.resume_fraction >= 0.0) || self.resume_heat() >= self.overheat_threshold {
            return Err(invalid("resume heat must be below overheat_threshold"));
        }
        if !(self.assist.strength >= 0.0 && self.assist.strength <= 1.0) {
            return Err(invalid("assist strength must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Upgrade multipliers applied to one weapon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponMultipliers {
    pub damage: f32,
    pub fire_rate: f32,
    pub ammo: f32,
}

impl Default for WeaponMultipliers {
    fn default() -> Self {
        Self {
            damage: 1.0,
            fire_rate: 1.0,
            ammo: 1.0,
        }
    }
}

/// Observable fire-control state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireState {
    Idle,
    Reloading,
    Overheated,
}

/// Why a fire request did not produce a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireRejection {
    Reloading,
    Overheated,
    /// Arrived before the fire interval elapsed; dropped, not queued.
    Cooldown,
}

/// A projectile leaving the barrel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub weapon: WeaponType,
    pub damage: f32,
    pub direction: Vec3,
    pub assisted_target: Option<HostileHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireOutcome {
    Fired(Shot),
    /// Magazine was empty; a reload started instead.
    ReloadTriggered,
    Rejected(FireRejection),
}

/// Fire-control state machine for one weapon slot.
#[derive(Debug, Clone)]
pub struct WeaponController {
    config: WeaponConfig,
    multipliers: WeaponMultipliers,
    ammo: u32,
    heat: f32,
    reload: Option<Countdown>,
    overheated: bool,
    since_last_shot: f32,
}

impl WeaponController {
    pub fn new(config: WeaponConfig) -> Self {
        let ammo = config.max_ammo;
        Self {
            config,
            multipliers: WeaponMultipliers::default(),
            ammo,
            heat: 0.0,
            reload: None,
            overheated: false,
            since_last_shot: f32::INFINITY,
        }
    }

    pub fn weapon_type(&self) -> WeaponType {
        self.config.weapon_type
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn multipliers(&self) -> WeaponMultipliers {
        self.multipliers
    }

    pub fn ammo(&self) -> u32 {
        self.ammo
    }

    /// Magazine size after the ammo multiplier.
    pub fn max_ammo(&self) -> u32 {
        ((self.config.max_ammo as f32 * self.multipliers.ammo).round() as u32).max(1)
    }

    pub fn heat(&self) -> f32 {
        self.heat
    }

    pub fn damage(&self) -> f32 {
        self.config.damage * self.multipliers.damage
    }

    /// Seconds between shots: `1 / (fire_rate * fire_rate_multiplier)`.
    pub fn fire_interval(&self) -> f32 {
        1.0 / (self.config.fire_rate * self.multipliers.fire_rate)
    }

    pub fn state(&self) -> FireState {
        if self.reload.is_some() {
            FireState::Reloading
        } else if self.overheated {
            FireState::Overheated
        } else {
            FireState::Idle
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload.is_some()
    }

    pub fn is_overheated(&self) -> bool {
        self.overheated
    }

    pub fn reload_remaining(&self) -> Option<f32> {
        self.reload.map(|r| r.remaining())
    }

    /// Apply an upgrade multiplier. A smaller magazine clips current ammo; a
    /// larger one only takes effect on the next reload.
    pub fn set_multiplier(&mut self, stat: WeaponStat, value: f32) {
        match stat {
            WeaponStat::Damage => self.multipliers.damage = value,
            WeaponStat::FireRate => self.multipliers.fire_rate = value,
            WeaponStat::Ammo => {
                self.multipliers.ammo = value;
                self.ammo = self.ammo.min(self.max_ammo());
            }
        }
    }

    /// Forget fire-rate gating, as when the weapon is drawn.
    pub fn clear_fire_gate(&mut self) {
        self.since_last_shot = f32::INFINITY;
    }

    /// Request a shot. On success the shot direction is the raw aim; see
    /// [`WeaponLoadout::fire`] for the assisted path.
    pub fn try_fire(&mut self, slot: usize, events: &mut Vec<GameEvent>) -> FireOutcome {
        if self.reload.is_some() {
            return FireOutcome::Rejected(FireRejection::Reloading);
        }
        if self.overheated || self.heat >= self.config.overheat_threshold {
            return FireOutcome::Rejected(FireRejection::Overheated);
        }
        if self.ammo == 0 {
            self.start_reload(slot, events);
            return FireOutcome::ReloadTriggered;
        }
        if self.since_last_shot + FIRE_INTERVAL_EPSILON < self.fire_interval() {
            return FireOutcome::Rejected(FireRejection::Cooldown);
        }

        self.ammo -= 1;
        self.heat = (self.heat + self.config.heat_per_shot).min(self.config.max_heat);
        self.since_last_shot = 0.0;
        log::debug!(
            "{} fired: ammo {}/{} heat {:.1}",
            self.config.weapon_type,
            self.ammo,
            self.max_ammo(),
            self.heat
        );
        events.push(GameEvent::WeaponFired {
            slot,
            weapon: self.config.weapon_type,
            ammo_left: self.ammo,
        });

        if self.heat >= self.config.overheat_threshold {
            self.overheated = true;
            log::debug!("{} overheated", self.config.weapon_type);
            events.push(GameEvent::Overheated {
                slot,
                weapon: self.config.weapon_type,
            });
        }

        FireOutcome::Fired(Shot {
            weapon: self.config.weapon_type,
            damage: self.damage(),
            direction: Vec3::ZERO,
            assisted_target: None,
        })
    }

    /// Begin reloading. Ignored while already reloading or with a full magazine.
    pub fn request_reload(&mut self, slot: usize, events: &mut Vec<GameEvent>) -> bool {
        if self.reload.is_some() || self.ammo >= self.max_ammo() {
            return false;
        }
        self.start_reload(slot, events);
        true
    }

    fn start_reload(&mut self, slot: usize, events: &mut Vec<GameEvent>) {
        self.reload = Some(Countdown::new(self.config.reload_time));
        events.push(GameEvent::ReloadStarted {
            slot,
            weapon: self.config.weapon_type,
        });
    }

    /// Advance timers by `dt` seconds: heat decay, overheat recovery, reload.
    pub fn update(&mut self, dt: f32, slot: usize, events: &mut Vec<GameEvent>) {
        let dt = clamp_seconds("weapon tick delta", dt);
        self.since_last_shot += dt;

        self.heat = (self.heat - self.config.heat_dissipation * dt).max(0.0);
        if self.overheated && self.heat <= self.config.resume_heat() {
            self.overheated = false;
            log::debug!("{} recovered from overheat", self.config.weapon_type);
            events.push(GameEvent::Recovered {
                slot,
                weapon: self.config.weapon_type,
            });
        }

        if let Some(reload) = self.reload.as_mut() {
            if reload.tick(dt) {
                self.reload = None;
                self.ammo = self.max_ammo();
                events.push(GameEvent::ReloadCompleted {
                    slot,
                    weapon: self.config.weapon_type,
                });
            }
        }
    }
}

/// Switching rules for the loadout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadoutConfig {
    /// Weapon type per slot, slot 0 drawn at start.
    #[serde(default = "default_slots")]
    pub slots: Vec<WeaponType>,
    /// When false (default) switching away from a reloading weapon is refused.
    /// When true the switch goes through and the reload finishes holstered.
    #[serde(default)]
    pub allow_switch_while_reloading: bool,
}

fn default_slots() -> Vec<WeaponType> {
    vec![WeaponType::Rifle, WeaponType::Shotgun, WeaponType::MachineGun]
}

impl Default for LoadoutConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            allow_switch_while_reloading: false,
        }
    }
}

/// The player's weapon slots and which one is drawn.
#[derive(Debug, Clone)]
pub struct WeaponLoadout {
    slots: Vec<WeaponController>,
    active: usize,
    allow_switch_while_reloading: bool,
}

impl WeaponLoadout {
    pub fn new(config: &LoadoutConfig, weapons: &[WeaponConfig]) -> Result<Self, ConfigError> {
        if config.slots.is_empty() {
            return Err(ConfigError::EmptyLoadout);
        }
        let slots = config
            .slots
            .iter()
            .map(|&ty| {
                weapons
                    .iter()
                    .find(|w| w.weapon_type == ty)
                    .map(|w| WeaponController::new(w.clone()))
                    .ok_or(ConfigError::UnknownLoadoutWeapon(ty))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            slots,
            active: 0,
            allow_switch_while_reloading: config.allow_switch_while_reloading,
        })
    }

    pub fn active_slot(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &WeaponController {
        &self.slots[self.active]
    }

    pub fn slot(&self, slot: usize) -> Option<&WeaponController> {
        self.slots.get(slot)
    }

    pub fn slots(&self) -> &[WeaponController] {
        &self.slots
    }

    /// Fire the drawn weapon, applying aim assist to a successful shot.
    pub fn fire(
        &mut self,
        origin: Vec3,
        aim: Vec3,
        hostiles: &[(HostileHandle, Vec3)],
        difficulty: f32,
        events: &mut Vec<GameEvent>,
    ) -> FireOutcome {
        let slot = self.active;
        let weapon = &mut self.slots[slot];
        match weapon.try_fire(slot, events) {
            FireOutcome::Fired(mut shot) => {
                let assist = &weapon.config.assist;
                let strength = assist.effective_strength(difficulty);
                let aimed = assist_aim(origin, aim, hostiles, assist, strength);
                shot.direction = aimed.direction;
                shot.assisted_target = aimed.target;
                FireOutcome::Fired(shot)
            }
            other => other,
        }
    }

    pub fn request_reload(&mut self, events: &mut Vec<GameEvent>) -> bool {
        let slot = self.active;
        self.slots[slot].request_reload(slot, events)
    }

    /// Draw another slot. Fire-rate gating on the drawn weapon is cleared;
    /// any reload keeps running.
    pub fn switch_to(
        &mut self,
        slot: usize,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), SwitchDenied> {
        if slot >= self.slots.len() {
            return Err(SwitchDenied::NoSuchSlot(slot));
        }
        if slot == self.active {
            return Ok(());
        }
        if self.slots[self.active].is_reloading() && !self.allow_switch_while_reloading {
            return Err(SwitchDenied::ReloadInProgress);
        }
        let from = self.active;
        self.active = slot;
        self.slots[slot].clear_fire_gate();
        log::debug!("Switched weapon slot {} -> {}", from, slot);
        events.push(GameEvent::WeaponSwitched { from, to: slot });
        Ok(())
    }

    /// Push a published multiplier into every slot holding the matching weapon.
    pub fn apply_stat(&mut self, stat: StatKey, value: f32) {
        if let StatKey::Weapon { weapon, stat } = stat {
            for slot in self.slots.iter_mut().filter(|s| s.weapon_type() == weapon) {
                slot.set_multiplier(stat, value);
            }
        }
    }

    /// Every slot ticks, holstered or not.
    pub fn update(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        for (slot, weapon) in self.slots.iter_mut().enumerate() {
            weapon.update(dt, slot, events);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magazine_weapon(max_ammo: u32) -> WeaponController {
        WeaponController::new(WeaponConfig {
            weapon_type: WeaponType::Rifle,
            damage: 10.0,
            fire_rate: 10.0,
            max_ammo,
            reload_time: 1.0,
            max_heat: 100.0,
            heat_per_shot: 0.0,
            overheat_threshold: 90.0,
            resume_fraction: 0.3,
            heat_dissipation: 10.0,
            assist: AssistConfig::disabled(),
        })
    }

    fn hot_weapon() -> WeaponController {
        WeaponController::new(WeaponConfig {
            weapon_type: WeaponType::MachineGun,
            damage: 10.0,
            fire_rate: 100.0,
            max_ammo: 500,
            reload_time: 1.0,
            max_heat: 100.0,
            heat_per_shot: 40.0,
            overheat_threshold: 75.0,
            resume_fraction: 0.3,
            heat_dissipation: 20.0,
            assist: AssistConfig::disabled(),
        })
    }

    #[test]
    fn weapon_invalid_delta_does_not_move_timers() {
        let mut w = hot_weapon();
        let mut events = Vec::new();
        assert!(matches!(w.try_fire(0, &mut events), FireOutcome::Fired(_)));
        assert_eq!(w.heat(), 40.0);
        w.update(-1.0, 0, &mut events);
        w.update(f32::NAN, 0, &mut events);
        assert_eq!(w.heat(), 40.0);
        assert_eq!(
            w.try_fire(0, &mut events),
            FireOutcome::Rejected(FireRejection::Cooldown)
        );
    }

    fn fire_n(w: &mut WeaponController, n: usize, events: &mut Vec<GameEvent>) -> usize {
        let mut fired = 0;
        for _ in 0..n {
            if matches!(w.try_fire(0, events), FireOutcome::Fired(_)) {
                fired += 1;
            }
            w.update(w.fire_interval(), 0, events);
        }
        fired
    }

    #[test]
    fn weapon_empty_magazine_triggers_reload() {
        let mut w = magazine_weapon(10);
        let mut events = Vec::new();
        assert_eq!(fire_n(&mut w, 10, &mut events), 10);
        assert_eq!(w.ammo(), 0);
        assert_eq!(w.try_fire(0, &mut events), FireOutcome::ReloadTriggered);
        assert_eq!(w.ammo(), 0);
        assert_eq!(w.state(), FireState::Reloading);
        assert!(events.contains(&GameEvent::ReloadStarted { slot: 0, weapon: WeaponType::Rifle }));
    }

    #[test]
    fn weapon_ammo_decrements_per_shot() {
        let mut w = magazine_weapon(10);
        let mut events = Vec::new();
        assert_eq!(fire_n(&mut w, 4, &mut events), 4);
        assert_eq!(w.ammo(), 6);
    }

    #[test]
    fn weapon_reload_restores_scaled_magazine() {
        let mut w = magazine_weapon(10);
        let mut events = Vec::new();
        w.set_multiplier(WeaponStat::Ammo, 1.5);
        fire_n(&mut w, 3, &mut events);
        assert!(w.request_reload(0, &mut events));
        assert_eq!(w.try_fire(0, &mut events), FireOutcome::Rejected(FireRejection::Reloading));
        w.update(0.6, 0, &mut events);
        assert!(w.is_reloading());
        w.update(0.6, 0, &mut events);
        assert!(!w.is_reloading());
        assert_eq!(w.ammo(), 15);
        assert!(events.contains(&GameEvent::ReloadCompleted {
            slot: 0,
            weapon: WeaponType::Rifle
        }));
    }

    #[test]
    fn weapon_reload_ignored_when_full() {
        let mut w = magazine_weapon(10);
        assert!(!w.request_reload(0, &mut Vec::new()));
        assert_eq!(w.state(), FireState::Idle);
    }

    #[test]
    fn weapon_requests_inside_interval_are_dropped() {
        let mut w = magazine_weapon(10);
        let mut events = Vec::new();
        assert!(matches!(w.try_fire(0, &mut events), FireOutcome::Fired(_)));
        assert_eq!(w.try_fire(0, &mut events), FireOutcome::Rejected(FireRejection::Cooldown));
        w.update(0.05, 0, &mut events);
        assert_eq!(w.try_fire(0, &mut events), FireOutcome::Rejected(FireRejection::Cooldown));
        w.update(0.05, 0, &mut events);
        assert!(matches!(w.try_fire(0, &mut events), FireOutcome::Fired(_)));
        assert_eq!(w.ammo(), 8);
    }

    #[test]
    fn weapon_fire_rate_multiplier_shortens_interval() {
        let mut w = magazine_weapon(10);
        w.set_multiplier(WeaponStat::FireRate, 2.0);
        assert!((w.fire_interval() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn weapon_overheat_hysteresis() {
        let mut w = hot_weapon();
        let mut events = Vec::new();
        assert!(matches!(w.try_fire(0, &mut events), FireOutcome::Fired(_)));
        w.update(0.01, 0, &mut events);
        assert!(matches!(w.try_fire(0, &mut events), FireOutcome::Fired(_)));
        assert_eq!(w.state(), FireState::Overheated);
        assert!(events.contains(&GameEvent::Overheated {
            slot: 0,
            weapon: WeaponType::MachineGun
        }));

        // Heat drops below the lockout threshold long before it reaches resume (30).
        for _ in 0..40 {
            w.update(0.1, 0, &mut events);
            if w.heat() > 30.0 {
                assert_eq!(
                    w.try_fire(0, &mut events),
                    FireOutcome::Rejected(FireRejection::Overheated)
                );
            }
        }
        assert!(w.heat() <= 30.0);
        assert_eq!(w.state(), FireState::Idle);
        assert!(events.contains(&GameEvent::Recovered { slot: 0, weapon: WeaponType::MachineGun }));
        assert!(matches!(w.try_fire(0, &mut events), FireOutcome::Fired(_)));
    }

    #[test]
    fn weapon_heat_stays_in_bounds() {
        let mut w = hot_weapon();
        let mut events = Vec::new();
        for _ in 0..200 {
            w.try_fire(0, &mut events);
            assert!(w.heat() <= w.config().max_heat);
            w.update(0.013, 0, &mut events);
            assert!(w.heat() >= 0.0);
        }
        w.update(100.0, 0, &mut events);
        assert_eq!(w.heat(), 0.0);
    }

    #[test]
    fn weapon_heat_decays_while_reloading() {
        let mut w = hot_weapon();
        let mut events = Vec::new();
        w.try_fire(0, &mut events);
        assert!(w.request_reload(0, &mut events));
        let before = w.heat();
        w.update(0.5, 0, &mut events);
        assert!(w.heat() < before);
        assert!(w.is_reloading());
    }

    #[test]
    fn weapon_shrinking_magazine_clips_ammo() {
        let mut w = magazine_weapon(10);
        w.set_multiplier(WeaponStat::Ammo, 0.5);
        assert_eq!(w.ammo(), 5);
    }

    fn loadout(allow_switch_while_reloading: bool) -> WeaponLoadout {
        let weapons = vec![
            WeaponConfig::new(WeaponType::Rifle),
            WeaponConfig::new(WeaponType::Shotgun),
        ];
        WeaponLoadout::new(
            &LoadoutConfig {
                slots: vec![WeaponType::Rifle, WeaponType::Shotgun],
                allow_switch_while_reloading,
            },
            &weapons,
        )
        .unwrap()
    }

    #[test]
    fn loadout_switch_refused_while_reloading() {
        let mut l = loadout(false);
        let mut events = Vec::new();
        l.fire(Vec3::ZERO, -Vec3::Z, &[], 1.0, &mut events);
        assert!(l.request_reload(&mut events));
        assert_eq!(l.switch_to(1, &mut events), Err(SwitchDenied::ReloadInProgress));
        assert_eq!(l.active_slot(), 0);
        assert_eq!(l.switch_to(5, &mut events), Err(SwitchDenied::NoSuchSlot(5)));
    }

    #[test]
    fn loadout_background_reload_when_allowed() {
        let mut l = loadout(true);
        let mut events = Vec::new();
        l.fire(Vec3::ZERO, -Vec3::Z, &[], 1.0, &mut events);
        assert!(l.request_reload(&mut events));
        assert_eq!(l.switch_to(1, &mut events), Ok(()));
        l.update(2.5, &mut events);
        let rifle = l.slot(0).unwrap();
        assert!(!rifle.is_reloading());
        assert_eq!(rifle.ammo(), 30);
    }

    #[test]
    fn loadout_switch_clears_fire_gate() {
        let mut l = loadout(false);
        let mut events = Vec::new();
        assert!(matches!(
            l.fire(Vec3::ZERO, -Vec3::Z, &[], 1.0, &mut events),
            FireOutcome::Fired(_)
        ));
        l.switch_to(1, &mut events).unwrap();
        assert!(matches!(
            l.fire(Vec3::ZERO, -Vec3::Z, &[], 1.0, &mut events),
            FireOutcome::Fired(_)
        ));
        l.switch_to(0, &mut events).unwrap();
        assert!(matches!(
            l.fire(Vec3::ZERO, -Vec3::Z, &[], 1.0, &mut events),
            FireOutcome::Fired(_)
        ));
        assert!(events.contains(&GameEvent::WeaponSwitched { from: 0, to: 1 }));
    }

    #[test]
    fn loadout_apply_stat_targets_matching_weapon() {
        let mut l = loadout(false);
        l.apply_stat(StatKey::weapon(WeaponType::Shotgun, WeaponStat::Damage), 2.0);
        assert_eq!(l.slot(0).unwrap().damage(), 25.0);
        assert_eq!(l.slot(1).unwrap().damage(), 30.0);
    }

    #[test]
    fn loadout_unknown_weapon_is_config_error() {
        let err = WeaponLoadout::new(
            &LoadoutConfig { slots: vec![WeaponType::Rocket], allow_switch_while_reloading: false },
            &[WeaponConfig::new(WeaponType::Rifle)],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownLoadoutWeapon(WeaponType::Rocket)));
    }

    #[test]
    fn default_weapon_configs_validate() {
        for ty in [
            WeaponType::Rifle,
            WeaponType::Shotgun,
            WeaponType::Sniper,
            WeaponType::Rocket,
            WeaponType::Flamethrower,
            WeaponType::MachineGun,
        ] {
            WeaponConfig::new(ty).validate().unwrap();
        }
    }
}
