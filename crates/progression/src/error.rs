//! Error types surfaced by the director.
//!
//! `ConfigError` is fatal and only produced while building a director from a
//! catalog. The `*Denied` types are ordinary, recoverable rejections: the caller
//! may simply try again on a later tick.

use std::path::PathBuf;

use thiserror::Error;

use crate::weapons::WeaponType;

/// Catalog problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("upgrade id '{0}' is defined more than once")]
    DuplicateUpgrade(String),

    #[error("upgrade '{node}' lists unknown prerequisite '{prerequisite}'")]
    UnknownPrerequisite { node: String, prerequisite: String },

    #[error("prerequisite cycle: {}", .cycle.join(" -> "))]
    PrerequisiteCycle { cycle: Vec<String> },

    #[error("upgrade '{id}' is invalid: {reason}")]
    InvalidUpgrade { id: String, reason: String },

    #[error("weapon {0} is configured more than once")]
    DuplicateWeapon(WeaponType),

    #[error("weapon {weapon} is invalid: {reason}")]
    InvalidWeapon { weapon: WeaponType, reason: String },

    #[error("loadout slot uses weapon {0} which has no configuration")]
    UnknownLoadoutWeapon(WeaponType),

    #[error("loadout has no weapon slots")]
    EmptyLoadout,

    #[error("encounter tuning is invalid: {0}")]
    InvalidEncounter(String),

    #[error("difficulty tuning is invalid: {0}")]
    InvalidDifficulty(String),

    #[error("ledger tuning is invalid: {0}")]
    InvalidLedger(String),

    #[error("could not read catalog {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse catalog")]
    Parse(#[from] ron::error::SpannedError),
}

/// Why a purchase request was turned down. No state changes when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseDenied {
    #[error("unknown upgrade '{0}'")]
    UnknownUpgrade(String),

    #[error("upgrade '{0}' is already at max level")]
    MaxLevel(String),

    #[error("upgrade '{id}' requires '{missing}' first")]
    PrerequisiteUnmet { id: String, missing: String },

    #[error("upgrade '{0}' is locked")]
    Locked(String),

    #[error("upgrade '{id}' costs {cost} credits but only {available} are available")]
    InsufficientFunds { id: String, cost: u64, available: u64 },
}

/// Why a weapon switch was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SwitchDenied {
    #[error("no weapon in slot {0}")]
    NoSuchSlot(usize),

    #[error("cannot switch while reloading")]
    ReloadInProgress,
}
