//! Credits, experience and player level.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::events::GameEvent;

const MAX_LEVEL: u32 = u32::MAX;
/// Single-level steps taken on a non-growing curve before the rest is
/// granted in bulk.
const FLAT_LEVEL_STEPS: u32 = 64;

/// Starting balances and level curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub starting_credits: u64,
    /// XP needed to go from level 1 to level 2.
    #[serde(default = "default_base_xp_threshold")]
    pub base_xp_threshold: u64,
    /// Threshold growth factor applied on every level-up.
    #[serde(default = "default_xp_growth")]
    pub xp_growth: f64,
}

fn default_base_xp_threshold() -> u64 {
    100
}
fn default_xp_growth() -> f64 {
    1.5
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_credits: 0,
            base_xp_threshold: default_base_xp_threshold(),
            xp_growth: default_xp_growth(),
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_xp_threshold == 0 {
            return Err(ConfigError::InvalidLedger("base_xp_threshold must be at least 1".into()));
        }
        if !self.xp_growth.is_finite() || self.xp_growth < 1.0 {
            return Err(ConfigError::InvalidLedger("xp_growth must be >= 1.0".into()));
        }
        Ok(())
    }
}

/// Plain value shape exchanged with the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub credits: u64,
    pub xp: u64,
    pub level: u32,
    pub xp_threshold: u64,
}

/// Tracks spendable credits and the XP/level curve.
///
/// `xp` is progress inside the current level; it is below `xp_threshold`
/// after any public call returns unless the level is capped at `u32::MAX`.
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    credits: u64,
    xp: u64,
    level: u32,
    xp_threshold: u64,
    xp_growth: f64,
}

impl ResourceLedger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            credits: config.starting_credits,
            xp: 0,
            level: 1,
            xp_threshold: config.base_xp_threshold.max(1),
            xp_growth: config.xp_growth.max(1.0),
        }
    }

    pub fn credits(&self) -> u64 {
        self.credits
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn xp_threshold(&self) -> u64 {
        self.xp_threshold
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.credits >= amount
    }

    pub fn credit(&mut self, amount: u64) {
        self.credits = self.credits.saturating_add(amount);
    }

    /// Remove `amount` credits.
    ///
    /// Callers check affordability first; reaching this with too few credits
    /// is a bug, not a gameplay outcome.
    pub fn debit(&mut self, amount: u64) {
        assert!(
            self.credits >= amount,
            "ledger underflow: debit of {} with only {} credits",
            amount,
            self.credits
        );
        self.credits -= amount;
    }

    /// Add experience, raising `LevelUp` for every level crossed.
    /// Returns the number of levels gained.
    pub fn grant_xp(&mut self, amount: u64, events: &mut Vec<GameEvent>) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        self.absorb_xp(Some(events))
    }

    /// Convert surplus XP into levels. Once the threshold stops growing the
    /// remaining levels are taken in one step and reported as a single
    /// `LevelUp` for the level reached.
    fn absorb_xp(&mut self, mut events: Option<&mut Vec<GameEvent>>) -> u32 {
        let mut gained = 0;
        while self.xp >= self.xp_threshold && self.level < MAX_LEVEL {
            let next = self.next_threshold();
            if next == self.xp_threshold && gained >= FLAT_LEVEL_STEPS {
                let levels = (self.xp / self.xp_threshold).min(u64::from(MAX_LEVEL - self.level));
                self.xp -= levels * self.xp_threshold;
                self.level += levels as u32;
                gained += levels as u32;
                log::info!("Reached level {} (+{} on a flat curve)", self.level, levels);
                if let Some(events) = events.as_deref_mut() {
                    events.push(GameEvent::LevelUp { level: self.level });
                }
                break;
            }
            self.xp -= self.xp_threshold;
            self.level += 1;
            self.xp_threshold = next;
            gained += 1;
            log::info!("Reached level {}", self.level);
            if let Some(events) = events.as_deref_mut() {
                events.push(GameEvent::LevelUp { level: self.level });
            }
        }
        gained
    }

    fn next_threshold(&self) -> u64 {
        let next = (self.xp_threshold as f64 * self.xp_growth).round() as u64;
        next.max(self.xp_threshold).max(1)
    }

    pub fn state(&self) -> LedgerState {
        LedgerState {
            credits: self.credits,
            xp: self.xp,
            level: self.level,
            xp_threshold: self.xp_threshold,
        }
    }

    /// Replace balances with a persisted state. Out-of-range values are
    /// normalised (level at least 1, threshold at least 1, surplus XP rolled
    /// into levels without raising events).
    pub fn restore(&mut self, state: LedgerState) {
        self.credits = state.credits;
        self.xp = state.xp;
        self.level = state.level.max(1);
        self.xp_threshold = state.xp_threshold.max(1);
        if state.level == 0 || state.xp_threshold == 0 {
            log::warn!("Normalised out-of-range ledger snapshot {:?}", state);
        }
        self.absorb_xp(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ResourceLedger {
        ResourceLedger::new(&LedgerConfig::default())
    }

    #[test]
    fn ledger_starts_at_level_one() {
        let l = ledger();
        assert_eq!(l.level(), 1);
        assert_eq!(l.xp(), 0);
        assert_eq!(l.xp_threshold(), 100);
    }

    #[test]
    fn ledger_level_up_grows_threshold_geometrically() {
        let mut l = ledger();
        let mut events = Vec::new();
        assert_eq!(l.grant_xp(120, &mut events), 1);
        assert_eq!(l.level(), 2);
        assert_eq!(l.xp(), 20);
        assert_eq!(l.xp_threshold(), 150);
        assert_eq!(events, vec![GameEvent::LevelUp { level: 2 }]);
    }

    #[test]
    fn ledger_multiple_levels_in_one_grant() {
        let mut l = ledger();
        let mut events = Vec::new();
        // 100 + 150 + 225 = 475
        assert_eq!(l.grant_xp(480, &mut events), 3);
        assert_eq!(l.level(), 4);
        assert_eq!(l.xp(), 5);
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn ledger_debit_reduces_credits() {
        let mut l = ledger();
        l.credit(250);
        l.debit(100);
        assert_eq!(l.credits(), 150);
        assert!(l.can_afford(150));
        assert!(!l.can_afford(151));
    }

    #[test]
    #[should_panic(expected = "ledger underflow")]
    fn ledger_debit_underflow_asserts() {
        let mut l = ledger();
        l.credit(10);
        l.debit(11);
    }

    #[test]
    fn ledger_restore_normalises_surplus_xp() {
        let mut l = ledger();
        l.restore(LedgerState {
            credits: 5,
            xp: 130,
            level: 0,
            xp_threshold: 100,
        });
        assert_eq!(l.level(), 2);
        assert_eq!(l.xp(), 30);
        assert_eq!(l.credits(), 5);
    }

    #[test]
    fn ledger_flat_curve_small_grant_reports_each_level() {
        let mut l = ResourceLedger::new(&LedgerConfig {
            xp_growth: 1.0,
            ..LedgerConfig::default()
        });
        let mut events = Vec::new();
        assert_eq!(l.grant_xp(250, &mut events), 2);
        assert_eq!(l.level(), 3);
        assert_eq!(l.xp(), 50);
        assert_eq!(
            events,
            vec![GameEvent::LevelUp { level: 2 }, GameEvent::LevelUp { level: 3 }]
        );
    }

    #[test]
    fn ledger_flat_curve_huge_restore_finishes_and_caps_level() {
        let mut l = ResourceLedger::new(&LedgerConfig {
            xp_growth: 1.0,
            ..LedgerConfig::default()
        });
        l.restore(LedgerState {
            credits: 0,
            xp: u64::MAX,
            level: 1,
            xp_threshold: 1,
        });
        assert_eq!(l.level(), u32::MAX);
        assert_eq!(l.xp_threshold(), 1);
        assert_eq!(l.xp(), u64::MAX - (u32::MAX as u64 - 1));
    }

    #[test]
    fn ledger_flat_curve_large_grant_is_bulk() {
        let mut l = ResourceLedger::new(&LedgerConfig {
            base_xp_threshold: 10,
            xp_growth: 1.0,
            ..LedgerConfig::default()
        });
        let mut events = Vec::new();
        assert_eq!(l.grant_xp(10_000_005, &mut events), 1_000_000);
        assert_eq!(l.level(), 1_000_001);
        assert_eq!(l.xp(), 5);
        assert_eq!(events.len(), FLAT_LEVEL_STEPS as usize + 1);
        assert_eq!(events.last(), Some(&GameEvent::LevelUp { level: 1_000_001 }));
    }
}
