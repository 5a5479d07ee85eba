//! Named stat multipliers and the sink that applies them to live gameplay objects.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::weapons::WeaponType;

/// Per-weapon stat driven by upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponStat {
    Damage,
    FireRate,
    Ammo,
}

impl WeaponStat {
    pub fn name(&self) -> &'static str {
        match self {
            WeaponStat::Damage => "damage",
            WeaponStat::FireRate => "fireRate",
            WeaponStat::Ammo => "ammo",
        }
    }
}

/// A stat the director publishes multipliers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKey {
    Speed,
    Health,
    Armor,
    Energy,
    Weapon { weapon: WeaponType, stat: WeaponStat },
}

impl StatKey {
    pub fn weapon(weapon: WeaponType, stat: WeaponStat) -> Self {
        StatKey::Weapon { weapon, stat }
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKey::Speed => f.write_str("speed"),
            StatKey::Health => f.write_str("health"),
            StatKey::Armor => f.write_str("armor"),
            StatKey::Energy => f.write_str("energy"),
            StatKey::Weapon { weapon, stat } => {
                write!(f, "weapon[{}].{}", weapon.key(), stat.name())
            }
        }
    }
}

/// Receives multiplier updates. The director only publishes values; the sink
/// decides how to apply them to ships, weapons or HUD.
pub trait StatSink {
    fn publish(&mut self, stat: StatKey, multiplier: f32);
}

/// Sink that ignores every update.
#[derive(Debug, Default)]
pub struct NullStatSink;

impl StatSink for NullStatSink {
    fn publish(&mut self, _stat: StatKey, _multiplier: f32) {}
}

/// Latest published value per stat.
#[derive(Debug, Clone, Default)]
pub struct StatBoard {
    values: HashMap<StatKey, f32>,
}

impl StatBoard {
    /// Current multiplier for `stat`; 1.0 if nothing was published.
    pub fn get(&self, stat: StatKey) -> f32 {
        self.values.get(&stat).copied().unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StatSink for StatBoard {
    fn publish(&mut self, stat: StatKey, multiplier: f32) {
        self.values.insert(stat, multiplier);
    }
}

impl StatSink for Vec<(StatKey, f32)> {
    fn publish(&mut self, stat: StatKey, multiplier: f32) {
        self.push((stat, multiplier));
    }
}

/// Shared sinks, so a host can keep a handle to what it handed the director.
impl<S: StatSink> StatSink for Rc<RefCell<S>> {
    fn publish(&mut self, stat: StatKey, multiplier: f32) {
        self.borrow_mut().publish(stat, multiplier);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_key_display_names() {
        assert_eq!(StatKey::Speed.to_string(), "speed");
        assert_eq!(
            StatKey::weapon(WeaponType::Rifle, WeaponStat::FireRate).to_string(),
            "weapon[rifle].fireRate"
        );
    }

    #[test]
    fn stat_board_defaults_to_one() {
        let mut board = StatBoard::default();
        assert_eq!(board.get(StatKey::Armor), 1.0);
        board.publish(StatKey::Armor, 1.3);
        assert_eq!(board.get(StatKey::Armor), 1.3);
    }

    #[test]
    fn shared_sink_records_through_handle() {
        let shared = Rc::new(RefCell::new(Vec::<(StatKey, f32)>::new()));
        let mut sink = shared.clone();
        sink.publish(StatKey::Energy, 1.1);
        assert_eq!(shared.borrow().as_slice(), &[(StatKey::Energy, 1.1)]);
    }
}
