//! Common ECS components shared by hosts that drive the director.

use glam::Vec3;

/// World-space position of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec3);

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Health pool of `base` scaled by a wave/difficulty stat multiplier.
    pub fn scaled(base: f32, scale: f32) -> Self {
        Self::new((base * scale).max(1.0))
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn percentage(&self) -> f32 {
        self.current / self.max
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Tag component for director-spawned hostiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hostile;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_scaled_never_below_one() {
        assert_eq!(Health::scaled(50.0, 0.0).max, 1.0);
        assert_eq!(Health::scaled(50.0, 2.0).max, 100.0);
    }

    #[test]
    fn health_damage_clamps_at_zero() {
        let mut h = Health::new(10.0);
        h.take_damage(25.0);
        assert!(h.is_dead());
        assert_eq!(h.current, 0.0);
    }
}
