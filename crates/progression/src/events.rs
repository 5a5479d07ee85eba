//! Semantic notifications raised by the director.
//!
//! Subsystems append to the bus queue while they run; the director flushes the
//! queue to every listener before returning from the call that raised them, so
//! delivery is synchronous and in raise order.

use crate::spawner::{HostileHandle, HostileKind};
use crate::weapons::WeaponType;

/// Where a reward came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardSource {
    WaveCompleted(u32),
    Kill(HostileKind),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    WaveStarted { wave: u32, enemies: u32 },
    WaveCompleted { wave: u32 },
    HostileSpawned { handle: HostileHandle, kind: HostileKind, stat_scale: f32 },
    RewardGranted { credits: u64, xp: u64, source: RewardSource },
    UpgradePurchased { id: String, level: u32 },
    UpgradeMaxed { id: String },
    WeaponFired { slot: usize, weapon: WeaponType, ammo_left: u32 },
    ReloadStarted { slot: usize, weapon: WeaponType },
    ReloadCompleted { slot: usize, weapon: WeaponType },
    Overheated { slot: usize, weapon: WeaponType },
    Recovered { slot: usize, weapon: WeaponType },
    WeaponSwitched { from: usize, to: usize },
    LevelUp { level: u32 },
}

/// Observer of director events.
pub trait EventListener {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventListener for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Observer list plus the queue of events raised during the current call.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Box<dyn EventListener>>,
    pending: Vec<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl EventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Queue an event for delivery on the next flush.
    pub fn emit(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    /// Queue subsystems write into.
    pub fn queue_mut(&mut self) -> &mut Vec<GameEvent> {
        &mut self.pending
    }

    pub fn pending(&self) -> &[GameEvent] {
        &self.pending
    }

    /// Deliver every queued event to every listener, in raise order.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            log::trace!("event {:?}", event);
            for listener in &mut self.listeners {
                listener.on_event(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn flush_delivers_in_order_to_all_listeners() {
        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let a = seen_a.clone();
        bus.subscribe(move |e: &GameEvent| a.borrow_mut().push(e.clone()));
        let b = seen_b.clone();
        bus.subscribe(move |e: &GameEvent| b.borrow_mut().push(e.clone()));

        bus.emit(GameEvent::WaveStarted { wave: 1, enemies: 5 });
        bus.emit(GameEvent::LevelUp { level: 2 });
        assert!(seen_a.borrow().is_empty());
        bus.flush();

        let expected = vec![
            GameEvent::WaveStarted { wave: 1, enemies: 5 },
            GameEvent::LevelUp { level: 2 },
        ];
        assert_eq!(*seen_a.borrow(), expected);
        assert_eq!(*seen_b.borrow(), expected);
        assert!(bus.pending().is_empty());
    }
}
