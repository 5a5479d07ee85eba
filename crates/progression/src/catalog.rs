//! Static catalog: upgrade nodes, weapon tuning and encounter/difficulty/ledger
//! settings supplied at startup. Loadable from RON; anything omitted falls back
//! to the built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyConfig;
use crate::error::ConfigError;
use crate::ledger::LedgerConfig;
use crate::spawner::EncounterConfig;
use crate::stats::{StatKey, WeaponStat};
use crate::upgrades::{UpgradeCategory, UpgradeNodeDef};
use crate::weapons::{LoadoutConfig, WeaponConfig, WeaponType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default = "default_upgrades")]
    pub upgrades: Vec<UpgradeNodeDef>,
    #[serde(default = "default_weapons")]
    pub weapons: Vec<WeaponConfig>,
    #[serde(default)]
    pub loadout: LoadoutConfig,
    #[serde(default)]
    pub encounter: EncounterConfig,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            upgrades: default_upgrades(),
            weapons: default_weapons(),
            loadout: LoadoutConfig::default(),
            encounter: EncounterConfig::default(),
            difficulty: DifficultyConfig::default(),
        }
    }
}

impl Catalog {
    pub fn from_ron_str(data: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(data)?)
    }

    /// Load a catalog file. A missing file yields the built-in catalog.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::from_ron_str(&data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No catalog at {:?}, using built-in catalog", path);
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Check every tuning record except the upgrade graph, which validates
    /// itself when built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ledger.validate()?;
        self.encounter.validate()?;
        self.difficulty.validate()?;
        for (i, weapon) in self.weapons.iter().enumerate() {
            weapon.validate()?;
            if self.weapons[..i].iter().any(|w| w.weapon_type == weapon.weapon_type) {
                return Err(ConfigError::DuplicateWeapon(weapon.weapon_type));
            }
        }
        Ok(())
    }
}

fn node(
    id: &str,
    name: &str,
    category: UpgradeCategory,
    stat: StatKey,
    max_level: u32,
    base_cost: u64,
    cost_multiplier: f64,
    effect_per_level: f32,
    prerequisites: &[&str],
) -> UpgradeNodeDef {
    UpgradeNodeDef {
        id: id.to_string(),
        name: name.to_string(),
        description: String::new(),
        category,
        stat,
        max_level,
        base_cost,
        cost_multiplier,
        effect_per_level,
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
    }
}

#[rustfmt::skip]
fn default_upgrades() -> Vec<UpgradeNodeDef> {
    use UpgradeCategory::*;
    let rifle = |stat| StatKey::weapon(WeaponType::Rifle, stat);
    let shotgun = |stat| StatKey::weapon(WeaponType::Shotgun, stat);
    let mg = |stat| StatKey::weapon(WeaponType::MachineGun, stat);
    vec![
        node("hull_plating", "Hull Plating", Hull, StatKey::Health, 5, 100, 1.5, 0.10, &[]),
        node("armor_weave", "Armor Weave", Hull, StatKey::Armor, 5, 150, 1.6, 0.10, &["hull_plating"]),
        node("thrusters", "Thrusters", Propulsion, StatKey::Speed, 5, 80, 1.4, 0.05, &[]),
        node("reactor_core", "Reactor Core", Systems, StatKey::Energy, 5, 120, 1.5, 0.10, &[]),
        node("rifle_calibration", "Rifle Calibration", Weapons, rifle(WeaponStat::Damage), 5, 90, 1.5, 0.08, &[]),
        node("rifle_cyclic", "Rifle Cyclic Rate", Weapons, rifle(WeaponStat::FireRate), 5, 110, 1.5, 0.06, &["rifle_calibration"]),
        node("rifle_drum", "Rifle Drum Magazine", Weapons, rifle(WeaponStat::Ammo), 3, 130, 1.7, 0.25, &["rifle_calibration"]),
        node("shotgun_choke", "Shotgun Choke", Weapons, shotgun(WeaponStat::Damage), 4, 140, 1.6, 0.12, &["rifle_calibration"]),
        node("mg_coolant", "MG Coolant Loop", Weapons, mg(WeaponStat::FireRate), 4, 160, 1.6, 0.08, &["reactor_core"]),
        node("mg_belt", "MG Belt Feed", Weapons, mg(WeaponStat::Ammo), 3, 150, 1.7, 0.20, &["mg_coolant", "armor_weave"]),
    ]
}

fn default_weapons() -> Vec<WeaponConfig> {
    [
        WeaponType::Rifle,
        WeaponType::Shotgun,
        WeaponType::Sniper,
        WeaponType::Rocket,
        WeaponType::Flamethrower,
        WeaponType::MachineGun,
    ]
    .into_iter()
    .map(WeaponConfig::new)
    .collect()
}
