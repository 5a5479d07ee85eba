//! Aim assist: nudges the aim direction toward the nearest hostile in range.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::spawner::HostileHandle;

/// Upper bound for assist strength reached through difficulty easing alone.
const MAX_EASED_STRENGTH: f32 = 0.9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Hostiles farther than this are ignored.
    #[serde(default = "default_range")]
    pub range: f32,
    /// Only hostiles within this cone around the aim are considered (degrees).
    #[serde(default = "default_acquire_angle")]
    pub acquire_angle_deg: f32,
    /// Largest correction applied to a single shot (degrees).
    #[serde(default = "default_max_angle")]
    pub max_assist_angle_deg: f32,
    /// Fraction of the remaining angle corrected, 0..=1. Only 1.0 snaps onto target.
    #[serde(default = "default_strength")]
    pub strength: f32,
    /// How much a low difficulty multiplier boosts `strength`.
    #[serde(default = "default_easing")]
    pub difficulty_easing: f32,
}

fn default_range() -> f32 {
    80.0
}
fn default_acquire_angle() -> f32 {
    20.0
}
fn default_max_angle() -> f32 {
    6.0
}
fn default_strength() -> f32 {
    0.4
}
fn default_easing() -> f32 {
    0.5
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            range: default_range(),
            acquire_angle_deg: default_acquire_angle(),
            max_assist_angle_deg: default_max_angle(),
            strength: default_strength(),
            difficulty_easing: default_easing(),
        }
    }
}

impl AssistConfig {
    /// No assist at all.
    pub fn disabled() -> Self {
        Self {
            strength: 0.0,
            difficulty_easing: 0.0,
            ..Self::default()
        }
    }

    /// Assist strength after the difficulty balancing hook.
    ///
    /// A multiplier below 1.0 (player struggling) raises strength, a multiplier
    /// above 1.0 lowers it. The result stays below a full snap unless the
    /// configured strength already is 1.0.
    pub fn effective_strength(&self, difficulty: f32) -> f32 {
        let base = self.strength.clamp(0.0, 1.0);
        if base >= 1.0 {
            return 1.0;
        }
        let eased = base * (1.0 + self.difficulty_easing * (1.0 - difficulty));
        eased.clamp(0.0, base.max(MAX_EASED_STRENGTH))
    }
}

/// Outcome of one assist pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssistedAim {
    pub direction: Vec3,
    pub target: Option<HostileHandle>,
    /// Correction applied, in radians.
    pub correction: f32,
}

/// Blend `aim` toward the nearest eligible hostile.
///
/// The rotation applied is `angle * strength`, capped at the configured
/// maximum assist angle.
pub fn assist_aim(
    origin: Vec3,
    aim: Vec3,
    hostiles: &[(HostileHandle, Vec3)],
    config: &AssistConfig,
    strength: f32,
) -> AssistedAim {
    let aim = aim.normalize_or_zero();
    let unassisted = AssistedAim {
        direction: aim,
        target: None,
        correction: 0.0,
    };
    if aim == Vec3::ZERO || strength <= 0.0 {
        return unassisted;
    }

    let acquire = config.acquire_angle_deg.to_radians();
    let nearest = hostiles
        .iter()
        .filter_map(|&(handle, pos)| {
            let offset = pos - origin;
            let dist = offset.length();
            if dist <= f32::EPSILON || dist > config.range {
                return None;
            }
            let to_target = offset / dist;
            let angle = aim.angle_between(to_target);
            (angle <= acquire).then_some((handle, dist, to_target, angle))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1));

    let Some((handle, _, to_target, angle)) = nearest else {
        return unassisted;
    };

    let correction = (angle * strength.min(1.0)).min(config.max_assist_angle_deg.to_radians());
    let direction = if angle <= 1e-6 || correction >= angle {
        to_target
    } else {
        let full = Quat::from_rotation_arc(aim, to_target);
        (Quat::IDENTITY.slerp(full, correction / angle) * aim).normalize()
    };

    AssistedAim {
        direction,
        target: Some(handle),
        correction,
    }
}
