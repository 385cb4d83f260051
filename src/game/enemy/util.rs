use std::{f32::consts::{PI, FRAC_PI_2}, fmt, str::FromStr};

use bevy::prelude::*;
use bevy::reflect::FromReflect;

use crate::game::{map::ReferenceId, util::EmfRanges};

use super::record::GhostConfigError;

/// Authored movement mode, "Follow" or "Patrol" in level files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, FromReflect)]
pub enum GhostMode {
    #[default]
    Follow,
    Patrol,
}

impl FromStr for GhostMode {
    type Err = GhostConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Follow" => Ok(Self::Follow),
            "Patrol" => Ok(Self::Patrol),
            other => Err(GhostConfigError::UnknownGhostType(other.to_string())),
        }
    }
}

impl fmt::Display for GhostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GhostMode::Follow => write!(f, "Follow"),
            GhostMode::Patrol => write!(f, "Patrol"),
        }
    }
}

/// Movement strategy, resolved from the config by the post-load hook
#[derive(Debug, Clone, Copy, PartialEq, Reflect, FromReflect)]
pub enum GhostBehavior {
    /// Pursues the tracked player while it is closer than `sight_range`
    Follow { sight_range: f32 },
    /// Sweeps back and forth between two reference markers
    Patrol { point_a: ReferenceId, point_b: ReferenceId },
}

impl Default for GhostBehavior {
    fn default() -> Self {
        Self::Follow { sight_range: super::record::DEFAULT_SIGHT_RANGE }
    }
}

/// Presentation tier, named after the EMF reader's colours
/// Red = near, Yellow = mid, Green = far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect, FromReflect)]
pub enum EmfTier {
    Stunned,
    Red,
    Yellow,
    #[default]
    Green,
}

impl EmfTier {
    /// Sprite is only drawn while stunned or in red range
    pub fn sprite_visible(&self) -> bool {
        matches!(self, EmfTier::Stunned | EmfTier::Red)
    }
}

/// Classifies a planar distance, `<=` on the inner boundary and `<` on the outer one
pub fn classify_tier(distance: f32, emf: &EmfRanges) -> EmfTier {
    if distance <= emf.red_range {
        EmfTier::Red
    } else if distance < emf.yellow_range {
        EmfTier::Yellow
    } else {
        EmfTier::Green
    }
}

/// Opacity for each tier, not clamped
#[derive(Debug, Clone, Copy, PartialEq, Reflect, FromReflect)]
pub struct TierAlpha {
    pub stun: f32,
    pub red: f32,
    pub yellow: f32,
    pub green: f32,
}

impl TierAlpha {
    pub fn for_tier(&self, tier: EmfTier) -> f32 {
        match tier {
            EmfTier::Stunned => self.stun,
            EmfTier::Red => self.red,
            EmfTier::Yellow => self.yellow,
            EmfTier::Green => self.green,
        }
    }
}

impl Default for TierAlpha {
    fn default() -> Self {
        Self { stun: 0.5, red: 1.0, yellow: 0.4, green: 0.0 }
    }
}

/// Particle trail bound to a ghost
#[derive(Debug, Clone, Copy, Default, PartialEq, Reflect, FromReflect)]
pub struct GhostParticle {
    pub following: bool,
    pub active: bool,
    pub stunned: bool,
}

impl GhostParticle {
    pub fn set_following(&mut self, following: bool) {
        self.following = following;
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// Eased position along the patrol line, 0 at point A and 1 at point B.
///
/// One sweep A -> B takes `speed` seconds and the whole cycle `2 * speed`.
/// The half-sine ease stops the ghost for an instant at each end.
pub fn patrol_progress(elapsed: f32, speed: f32) -> f32 {
    let phase = (elapsed % (speed * 2.0)) / speed;
    ((PI * phase - FRAC_PI_2).sin() / 2.0) + 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn ranges() -> EmfRanges {
        EmfRanges { red_range: 60.0, yellow_range: 160.0 }
    }

    #[test]
    fn patrol_starts_at_point_a() {
        assert!(patrol_progress(0.0, 2.0).abs() < EPSILON);
    }

    #[test]
    fn patrol_reaches_point_b_after_one_sweep() {
        assert!((patrol_progress(2.0, 2.0) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn patrol_is_halfway_at_quarter_cycle() {
        assert!((patrol_progress(1.0, 2.0) - 0.5).abs() < EPSILON);
        assert!((patrol_progress(3.0, 2.0) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn patrol_repeats_every_two_sweeps() {
        for elapsed in [0.0, 0.3, 1.1, 2.5, 3.9] {
            let first = patrol_progress(elapsed, 2.0);
            let second = patrol_progress(elapsed + 4.0, 2.0);
            assert!((first - second).abs() < 1e-4, "{elapsed}: {first} vs {second}");
        }
    }

    #[test]
    fn patrol_progress_stays_in_unit_range() {
        let mut elapsed = 0.0;
        while elapsed < 10.0 {
            let progress = patrol_progress(elapsed, 1.5);
            assert!((-EPSILON..=1.0 + EPSILON).contains(&progress));
            elapsed += 0.07;
        }
    }

    #[test]
    fn red_boundary_is_inclusive() {
        assert_eq!(classify_tier(60.0, &ranges()), EmfTier::Red);
        assert_eq!(classify_tier(60.01, &ranges()), EmfTier::Yellow);
    }

    #[test]
    fn yellow_boundary_falls_to_green() {
        assert_eq!(classify_tier(159.99, &ranges()), EmfTier::Yellow);
        assert_eq!(classify_tier(160.0, &ranges()), EmfTier::Green);
        assert_eq!(classify_tier(1000.0, &ranges()), EmfTier::Green);
    }

    #[test]
    fn only_stunned_and_red_draw_the_sprite() {
        assert!(EmfTier::Stunned.sprite_visible());
        assert!(EmfTier::Red.sprite_visible());
        assert!(!EmfTier::Yellow.sprite_visible());
        assert!(!EmfTier::Green.sprite_visible());
    }

    #[test]
    fn ghost_mode_parses_level_strings() {
        assert_eq!("Follow".parse::<GhostMode>().unwrap(), GhostMode::Follow);
        assert_eq!("Patrol".parse::<GhostMode>().unwrap(), GhostMode::Patrol);
        assert_eq!(
            "patrol".parse::<GhostMode>(),
            Err(GhostConfigError::UnknownGhostType("patrol".to_string()))
        );
    }
}
