//! Combat progression: wave encounters steered by adaptive difficulty, a
//! prerequisite-gated upgrade tree and weapon fire control, driven together
//! by [`CombatDirector`].

pub mod catalog;
pub mod difficulty;
pub mod director;
pub mod error;
pub mod events;
pub mod ledger;
pub mod persistence;
pub mod spawner;
pub mod stats;
pub mod targeting;
pub mod upgrades;
pub mod weapons;

pub use catalog::Catalog;
pub use difficulty::{DifficultyConfig, DifficultyGovernor, Trend};
pub use director::CombatDirector;
pub use error::{ConfigError, PurchaseDenied, SwitchDenied};
pub use events::{EventBus, EventListener, GameEvent, RewardSource};
pub use ledger::{LedgerConfig, LedgerState, ResourceLedger};
pub use persistence::{MemoryStore, NodeSnapshot, ProgressSnapshot, SnapshotStore, StoreError};
pub use spawner::{
    EncounterConfig, EncounterDirector, EntitySpawner, HostileHandle, HostileKind, RemovalCause,
    SpawnRequest, ThreatLevel, WaveState,
};
pub use stats::{NullStatSink, StatBoard, StatKey, StatSink, WeaponStat};
pub use targeting::{assist_aim, AssistConfig, AssistedAim};
pub use upgrades::{PurchaseReceipt, UpgradeCategory, UpgradeGraph, UpgradeNode, UpgradeNodeDef};
pub use weapons::{
    FireOutcome, FireRejection, FireState, LoadoutConfig, Shot, WeaponConfig, WeaponController,
    WeaponLoadout, WeaponType,
};
