//! hecs-backed hostile population: the director's entity-spawn collaborator.

use engine_core::{Health, Hostile, Position};
use glam::Vec3;
use hecs::{Entity, World};
use progression::{EntitySpawner, HostileHandle, SpawnRequest};

/// Distance at which a hostile counts as touching the player.
pub const CONTACT_RANGE: f32 = 1.5;

pub struct HostileWorld {
    world: World,
}

impl Default for HostileWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl HostileWorld {
    pub fn new() -> Self {
        Self { world: World::new() }
    }

    fn entity(handle: HostileHandle) -> Option<Entity> {
        Entity::from_bits(handle.0)
    }

    fn handle(entity: Entity) -> HostileHandle {
        HostileHandle(entity.to_bits().get())
    }

    pub fn len(&self) -> usize {
        self.world.query::<&Hostile>().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live hostiles and where they are, for aim assist.
    pub fn positions(&self) -> Vec<(HostileHandle, Vec3)> {
        let mut out: Vec<_> = self
            .world
            .query::<(&Position, &Hostile)>()
            .iter()
            .map(|(e, (pos, _))| (Self::handle(e), pos.0))
            .collect();
        out.sort_by_key(|(h, _)| *h);
        out
    }

    /// Apply damage. Returns true when this hit killed the hostile; the
    /// entity is removed from the world.
    pub fn damage(&mut self, handle: HostileHandle, amount: f32) -> bool {
        let Some(entity) = Self::entity(handle) else {
            return false;
        };
        let dead = match self.world.get::<&mut Health>(entity) {
            Ok(mut health) => {
                health.take_damage(amount);
                health.is_dead()
            }
            Err(_) => return false,
        };
        if dead {
            let _ = self.world.despawn(entity);
        }
        dead
    }

    /// Move every hostile toward `target`. Hostiles that reach it are removed
    /// and returned.
    pub fn advance(&mut self, dt: f32, target: Vec3, speed: f32) -> Vec<HostileHandle> {
        let mut arrived = Vec::new();
        for (entity, (pos, _)) in self.world.query_mut::<(&mut Position, &Hostile)>() {
            let to_target = target - pos.0;
            let distance = to_target.length();
            if distance <= CONTACT_RANGE {
                arrived.push(entity);
                continue;
            }
            let step = (speed * dt).min(distance);
            pos.0 += to_target / distance * step;
        }
        for &entity in &arrived {
            let _ = self.world.despawn(entity);
        }
        arrived.into_iter().map(Self::handle).collect()
    }
}

impl EntitySpawner for HostileWorld {
    fn spawn(&mut self, request: &SpawnRequest) -> HostileHandle {
        let entity = self.world.spawn((
            Position(request.position),
            Health::scaled(request.kind.base_health(), request.stat_scale),
            Hostile,
            request.kind,
        ));
        log::debug!(
            "Spawned {} at {:?} (x{:.2})",
            request.kind.name(),
            request.position,
            request.stat_scale
        );
        Self::handle(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progression::HostileKind;

    fn request(kind: HostileKind, position: Vec3, stat_scale: f32) -> SpawnRequest {
        SpawnRequest {
            kind,
            position,
            stat_scale,
            wave: 1,
        }
    }

    #[test]
    fn spawned_hostile_has_scaled_health() {
        let mut world = HostileWorld::new();
        let handle = world.spawn(&request(HostileKind::Scout, Vec3::new(20.0, 0.0, 0.0), 2.0));
        assert_eq!(world.len(), 1);
        assert!(!world.damage(handle, 59.0));
        assert!(world.damage(handle, 1.0));
        assert!(world.is_empty());
        assert!(!world.damage(handle, 1.0));
    }

    #[test]
    fn handles_are_distinct() {
        let mut world = HostileWorld::new();
        let a = world.spawn(&request(HostileKind::Brute, Vec3::X * 30.0, 1.0));
        let b = world.spawn(&request(HostileKind::Brute, Vec3::Z * 30.0, 1.0));
        assert_ne!(a, b);
        assert_eq!(world.positions().len(), 2);
    }

    #[test]
    fn hostiles_close_in_and_arrive() {
        let mut world = HostileWorld::new();
        let near = world.spawn(&request(HostileKind::Warrior, Vec3::new(3.0, 0.0, 0.0), 1.0));
        let far = world.spawn(&request(HostileKind::Warrior, Vec3::new(50.0, 0.0, 0.0), 1.0));

        assert!(world.advance(0.5, Vec3::ZERO, 4.0).is_empty());
        assert_eq!(world.advance(0.5, Vec3::ZERO, 4.0), vec![near]);
        let remaining = world.positions();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, far);
        assert!((remaining[0].1.x - 46.0).abs() < 1e-4);
    }
}
