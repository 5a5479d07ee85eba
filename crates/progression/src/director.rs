//! Session façade tying the ledger, upgrade graph, weapon loadout, encounter
//! director and difficulty governor to one shared tick.

use glam::Vec3;

use crate::catalog::Catalog;
use crate::difficulty::DifficultyGovernor;
use crate::error::{ConfigError, PurchaseDenied, SwitchDenied};
use crate::events::{EventBus, EventListener, GameEvent, RewardSource};
use crate::ledger::ResourceLedger;
use crate::persistence::{ProgressSnapshot, SnapshotStore, StoreError};
use crate::spawner::{
    EncounterDirector, EntitySpawner, HostileHandle, HostileKind, RemovalCause, WaveReward,
};
use crate::stats::{StatBoard, StatKey, StatSink};
use crate::upgrades::{PurchaseReceipt, UpgradeGraph};
use crate::weapons::{FireOutcome, WeaponLoadout};

/// Owns one play session's progression state.
///
/// Every mutating call flushes the events it raised to subscribers before
/// returning, in the order they were raised.
pub struct CombatDirector {
    ledger: ResourceLedger,
    upgrades: UpgradeGraph,
    loadout: WeaponLoadout,
    encounter: EncounterDirector,
    governor: DifficultyGovernor,
    bus: EventBus,
    stats: StatBoard,
    sink: Box<dyn StatSink>,
}

impl CombatDirector {
    /// Build a director from a catalog. Any catalog problem is fatal here.
    pub fn new(catalog: Catalog, sink: impl StatSink + 'static) -> Result<Self, ConfigError> {
        catalog.validate()?;
        let upgrades = UpgradeGraph::new(catalog.upgrades)?;
        let loadout = WeaponLoadout::new(&catalog.loadout, &catalog.weapons)?;

        let mut director = Self {
            ledger: ResourceLedger::new(&catalog.ledger),
            upgrades,
            loadout,
            encounter: EncounterDirector::new(catalog.encounter),
            governor: DifficultyGovernor::new(catalog.difficulty),
            bus: EventBus::new(),
            stats: StatBoard::default(),
            sink: Box::new(sink),
        };
        director.publish_all();
        log::info!(
            "Combat director ready: {} upgrades, {} weapon slots",
            director.upgrades.len(),
            director.loadout.slots().len()
        );
        Ok(director)
    }

    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.bus.subscribe(listener);
    }

    /// Schedule the first wave.
    pub fn start(&mut self) {
        self.encounter.begin();
    }

    /// Advance every subsystem by `dt` seconds. `anchor` is the point hostiles
    /// spawn around, usually the player.
    pub fn tick(&mut self, dt: f32, anchor: Vec3, spawner: &mut dyn EntitySpawner) {
        self.governor.update(dt);
        let reward = self.encounter.update(
            dt,
            self.governor.multiplier(),
            anchor,
            spawner,
            self.bus.queue_mut(),
        );
        if let Some(reward) = reward {
            self.grant_wave_reward(reward);
        }
        self.loadout.update(dt, self.bus.queue_mut());
        self.bus.flush();
    }

    fn grant_wave_reward(&mut self, reward: WaveReward) {
        self.grant(reward.credits, reward.xp, RewardSource::WaveCompleted(reward.wave));
    }

    fn grant(&mut self, credits: u64, xp: u64, source: RewardSource) {
        self.ledger.credit(credits);
        self.bus.emit(GameEvent::RewardGranted { credits, xp, source });
        self.ledger.grant_xp(xp, self.bus.queue_mut());
    }

    /// Fire the drawn weapon. `hostiles` are the candidates for aim assist.
    pub fn request_fire(
        &mut self,
        origin: Vec3,
        aim: Vec3,
        hostiles: &[(HostileHandle, Vec3)],
    ) -> FireOutcome {
        let outcome = self.loadout.fire(
            origin,
            aim,
            hostiles,
            self.governor.multiplier(),
            self.bus.queue_mut(),
        );
        self.bus.flush();
        outcome
    }

    pub fn request_reload(&mut self) -> bool {
        let started = self.loadout.request_reload(self.bus.queue_mut());
        self.bus.flush();
        started
    }

    pub fn switch_weapon(&mut self, slot: usize) -> Result<(), SwitchDenied> {
        let result = self.loadout.switch_to(slot, self.bus.queue_mut());
        self.bus.flush();
        result
    }

    pub fn can_purchase(&self, id: &str) -> bool {
        self.upgrades.can_purchase(id, &self.ledger)
    }

    /// Buy one level of an upgrade. The ledger is debited before the new
    /// multiplier is published; a denied purchase changes nothing.
    pub fn purchase(&mut self, id: &str) -> Result<PurchaseReceipt, PurchaseDenied> {
        let receipt = self.upgrades.purchase(id, &mut self.ledger, self.bus.queue_mut());
        if let Ok(receipt) = &receipt {
            self.publish(receipt.stat, receipt.multiplier);
        }
        self.bus.flush();
        receipt
    }

    /// Host reports that a hostile was killed by the player.
    pub fn on_hostile_died(&mut self, handle: HostileHandle) -> Option<HostileKind> {
        let kind = self.encounter.on_hostile_removed(handle, RemovalCause::Killed)?;
        self.governor.record_kill();
        let (credits, xp) = kind.bounty();
        self.grant(credits, xp, RewardSource::Kill(kind));
        self.bus.flush();
        Some(kind)
    }

    /// Host removed a hostile for any reason other than a player kill.
    pub fn on_hostile_despawned(&mut self, handle: HostileHandle) {
        self.encounter.on_hostile_removed(handle, RemovalCause::Despawned);
    }

    pub fn on_player_died(&mut self) {
        log::info!("Player died (streak was {})", self.governor.streak());
        self.governor.record_player_death();
    }

    fn publish(&mut self, stat: StatKey, multiplier: f32) {
        self.stats.publish(stat, multiplier);
        self.loadout.apply_stat(stat, multiplier);
        self.sink.publish(stat, multiplier);
    }

    fn publish_all(&mut self) {
        for (stat, multiplier) in self.upgrades.multipliers() {
            self.publish(stat, multiplier);
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let ledger = self.ledger.state();
        ProgressSnapshot {
            credits: ledger.credits,
            xp: ledger.xp,
            level: ledger.level,
            xp_threshold: ledger.xp_threshold,
            nodes: self.upgrades.snapshot(),
        }
    }

    /// Replace ledger balances and upgrade levels, then republish every
    /// multiplier. No events are raised.
    pub fn restore(&mut self, snapshot: &ProgressSnapshot) {
        self.ledger.restore(snapshot.ledger());
        self.upgrades.restore(&snapshot.nodes);
        self.publish_all();
        log::info!(
            "Restored progress: level {}, {} credits",
            self.ledger.level(),
            self.ledger.credits()
        );
    }

    /// Restore from `store` if it holds a snapshot. Returns whether one was found.
    pub fn load_from(&mut self, store: &mut dyn SnapshotStore) -> Result<bool, StoreError> {
        match store.load()? {
            Some(snapshot) => {
                self.restore(&snapshot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn save_to(&self, store: &mut dyn SnapshotStore) -> Result<(), StoreError> {
        store.save(&self.snapshot())
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn upgrades(&self) -> &UpgradeGraph {
        &self.upgrades
    }

    pub fn loadout(&self) -> &WeaponLoadout {
        &self.loadout
    }

    pub fn encounter(&self) -> &EncounterDirector {
        &self.encounter
    }

    pub fn governor(&self) -> &DifficultyGovernor {
        &self.governor
    }

    /// Last published multiplier for `stat`.
    pub fn stat(&self, stat: StatKey) -> f32 {
        self.stats.get(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::spawner::{SpawnRequest, WaveState};
    use crate::stats::{NullStatSink, WeaponStat};
    use crate::weapons::WeaponType;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct CountingSpawner {
        requests: Vec<SpawnRequest>,
        next: u64,
    }

    impl EntitySpawner for CountingSpawner {
        fn spawn(&mut self, request: &SpawnRequest) -> HostileHandle {
            self.requests.push(*request);
            self.next += 1;
            HostileHandle(self.next)
        }
    }

    fn quick_catalog(credits: u64) -> Catalog {
        let mut catalog = Catalog::default();
        catalog.ledger.starting_credits = credits;
        catalog.encounter.base_enemies_per_wave = 2;
        catalog.encounter.first_wave_delay = 0.0;
        catalog.encounter.spawn_cooldown = 0.0;
        catalog.encounter.intermission = 5.0;
        catalog.encounter.seed = Some(7);
        catalog
    }

    fn recorder(director: &mut CombatDirector) -> Rc<RefCell<Vec<GameEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        director.subscribe(move |e: &GameEvent| sink.borrow_mut().push(e.clone()));
        seen
    }

    #[test]
    fn director_rejects_invalid_catalog() {
        let mut catalog = Catalog::default();
        catalog.upgrades[0].prerequisites.push("armor_weave".into());
        assert!(matches!(
            CombatDirector::new(catalog, NullStatSink),
            Err(ConfigError::PrerequisiteCycle { .. })
        ));
    }

    #[test]
    fn director_purchase_publishes_after_debit() {
        let published = Rc::new(RefCell::new(Vec::<(StatKey, f32)>::new()));
        let mut director = CombatDirector::new(quick_catalog(300), published.clone()).unwrap();
        let seen = recorder(&mut director);
        published.borrow_mut().clear();

        let receipt = director.purchase("hull_plating").unwrap();
        assert_eq!(receipt.cost, 100);
        assert_eq!(receipt.unlocked, vec!["armor_weave".to_string()]);
        assert_eq!(director.ledger().credits(), 200);
        assert!((director.stat(StatKey::Health) - 1.1).abs() < 1e-6);
        assert_eq!(published.borrow().len(), 1);
        assert_eq!(published.borrow()[0].0, StatKey::Health);
        assert_eq!(
            *seen.borrow(),
            vec![GameEvent::UpgradePurchased {
                id: "hull_plating".into(),
                level: 1
            }]
        );

        assert_eq!(director.upgrades().next_cost("hull_plating"), Some(150));
    }

    #[test]
    fn director_denied_purchase_changes_nothing() {
        let published = Rc::new(RefCell::new(Vec::<(StatKey, f32)>::new()));
        let mut director = CombatDirector::new(quick_catalog(50), published.clone()).unwrap();
        let seen = recorder(&mut director);
        published.borrow_mut().clear();

        let denied = director.purchase("hull_plating").unwrap_err();
        assert_eq!(
            denied,
            PurchaseDenied::InsufficientFunds {
                id: "hull_plating".into(),
                cost: 100,
                available: 50
            }
        );
        assert_eq!(director.ledger().credits(), 50);
        assert_eq!(director.upgrades().node("hull_plating").unwrap().level(), 0);
        assert!(published.borrow().is_empty());
        assert!(seen.borrow().is_empty());
        assert!(!director.can_purchase("armor_weave"));
    }

    #[test]
    fn director_weapon_upgrade_reaches_loadout() {
        let mut director = CombatDirector::new(quick_catalog(1000), NullStatSink).unwrap();
        assert_eq!(director.loadout().active().weapon_type(), WeaponType::Rifle);
        director.purchase("rifle_calibration").unwrap();
        let rifle_damage = StatKey::weapon(WeaponType::Rifle, WeaponStat::Damage);
        assert!((director.stat(rifle_damage) - 1.08).abs() < 1e-6);
        assert!((director.loadout().active().damage() - 27.0).abs() < 1e-4);

        match director.request_fire(Vec3::ZERO, Vec3::NEG_Z, &[]) {
            FireOutcome::Fired(shot) => assert!((shot.damage - 27.0).abs() < 1e-4),
            other => panic!("expected a shot, got {:?}", other),
        }
    }

    #[test]
    fn director_wave_cycle_with_rewards() {
        let mut director = CombatDirector::new(quick_catalog(0), NullStatSink).unwrap();
        let seen = recorder(&mut director);
        let mut spawner = CountingSpawner::default();
        director.start();

        for _ in 0..10 {
            director.tick(0.1, Vec3::ZERO, &mut spawner);
        }
        assert_eq!(director.encounter().wave_number(), 1);
        assert_eq!(spawner.requests.len(), 2);
        for request in &spawner.requests {
            assert!((request.stat_scale - 1.25).abs() < 1e-3);
        }

        let mut bounty = 0;
        for handle in [HostileHandle(1), HostileHandle(2)] {
            let kind = director.on_hostile_died(handle).unwrap();
            bounty += kind.bounty().0;
        }
        assert_eq!(director.on_hostile_died(HostileHandle(1)), None);
        assert_eq!(director.governor().total_kills(), 2);

        director.tick(0.1, Vec3::ZERO, &mut spawner);
        assert_eq!(director.encounter().state(), WaveState::Complete);
        assert_eq!(director.ledger().credits(), bounty + 50);

        let completions = seen
            .borrow()
            .iter()
            .filter(|e| matches!(e, GameEvent::WaveCompleted { wave: 1 }))
            .count();
        assert_eq!(completions, 1);
        assert!(seen.borrow().contains(&GameEvent::RewardGranted {
            credits: 50,
            xp: 25,
            source: RewardSource::WaveCompleted(1),
        }));

        for _ in 0..60 {
            director.tick(0.1, Vec3::ZERO, &mut spawner);
        }
        assert_eq!(director.encounter().wave_number(), 2);
        assert_eq!(director.encounter().state(), WaveState::Active);
    }

    #[test]
    fn director_despawn_is_not_a_kill() {
        let mut director = CombatDirector::new(quick_catalog(0), NullStatSink).unwrap();
        let mut spawner = CountingSpawner::default();
        director.start();
        for _ in 0..5 {
            director.tick(0.1, Vec3::ZERO, &mut spawner);
        }
        director.on_hostile_despawned(HostileHandle(1));
        assert_eq!(director.governor().total_kills(), 0);
        assert_eq!(director.ledger().credits(), 0);
        assert_eq!(director.encounter().wave().live_count(), 1);
    }

    #[test]
    fn director_player_death_resets_streak() {
        let mut director = CombatDirector::new(quick_catalog(0), NullStatSink).unwrap();
        let mut spawner = CountingSpawner::default();
        director.start();
        for _ in 0..5 {
            director.tick(0.1, Vec3::ZERO, &mut spawner);
        }
        director.on_hostile_died(HostileHandle(1));
        assert_eq!(director.governor().streak(), 1);
        director.on_player_died();
        assert_eq!(director.governor().streak(), 0);
        assert_eq!(director.governor().total_deaths(), 1);
    }

    #[test]
    fn director_switch_denied_while_reloading() {
        let mut director = CombatDirector::new(quick_catalog(0), NullStatSink).unwrap();
        assert!(matches!(
            director.request_fire(Vec3::ZERO, Vec3::NEG_Z, &[]),
            FireOutcome::Fired(_)
        ));
        assert!(director.request_reload());
        assert_eq!(director.switch_weapon(1), Err(SwitchDenied::ReloadInProgress));
        assert_eq!(director.switch_weapon(9), Err(SwitchDenied::NoSuchSlot(9)));
        assert_eq!(director.loadout().active_slot(), 0);
    }

    #[test]
    fn director_snapshot_roundtrip() {
        let mut director = CombatDirector::new(quick_catalog(500), NullStatSink).unwrap();
        director.purchase("hull_plating").unwrap();
        director.purchase("armor_weave").unwrap();
        let mut store = MemoryStore::new();
        director.save_to(&mut store).unwrap();

        let published = Rc::new(RefCell::new(Vec::<(StatKey, f32)>::new()));
        let mut fresh = CombatDirector::new(quick_catalog(0), published.clone()).unwrap();
        assert!(fresh.load_from(&mut store).unwrap());
        assert_eq!(fresh.snapshot(), director.snapshot());
        assert_eq!(fresh.ledger().credits(), 250);
        assert!((fresh.stat(StatKey::Armor) - 1.1).abs() < 1e-6);
        assert!(published
            .borrow()
            .iter()
            .any(|&(stat, m)| stat == StatKey::Armor && (m - 1.1).abs() < 1e-6));
    }

    #[test]
    fn director_load_from_empty_store() {
        let mut director = CombatDirector::new(quick_catalog(10), NullStatSink).unwrap();
        assert!(!director.load_from(&mut MemoryStore::new()).unwrap());
        assert_eq!(director.ledger().credits(), 10);
    }
}
