use std::{path::Path, fs, io::Write};

use bevy::{prelude::*, sprite::collide_aabb::collide};

use anyhow::{bail, Result};
use serde::Deserialize;

pub const DEFAULT_SETTINGS: &str = include_str!("../assets/settings.toml");

const LOCAL_SETTINGS: &str = "./settings.toml";

/// Distance on the XY plane, depth is ignored
pub fn calculate_distance(pos1: Vec3, pos2: Vec3) -> f32 {
    (((pos1.x - pos2.x).powf(2.0)) + ((pos1.y - pos2.y).powf(2.0))).sqrt()
}

/// Steps from `current` towards `target` by at most `max_step`, never past it
pub fn move_towards(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();

    if distance <= max_step || distance == 0.0 {
        return target;
    }

    current + delta / distance * max_step
}

/// Returns True is collision is detected
pub fn check_collision(a: Vec3, a_size: Vec2, b: Vec3, b_size: Vec2) -> bool {
    collide(a, a_size, b, b_size).is_some()
}

/// Thresholds of the player's EMF reader
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Resource, Reflect)]
pub struct EmfRanges {
    pub red_range: f32,
    pub yellow_range: f32,
}

impl Default for EmfRanges {
    fn default() -> Self {
        Self { red_range: 60.0, yellow_range: 160.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSettings {
    pub speed: f32,
    pub lives: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LevelSettings {
    #[serde(default)]
    pub custom_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Resource)]
pub struct Settings {
    pub emf: EmfRanges,
    pub player: PlayerSettings,
    #[serde(default)]
    pub level: LevelSettings,
}

impl Settings {
    pub fn parse(raw: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(raw)?;

        let emf = settings.emf;
        if emf.red_range < 0.0 || emf.red_range >= emf.yellow_range {
            bail!("EMF ranges must satisfy 0 <= red_range < yellow_range (got {} / {})", emf.red_range, emf.yellow_range);
        }

        if settings.player.speed <= 0.0 {
            bail!("Player speed must be positive (got {})", settings.player.speed);
        }

        Ok(settings)
    }
}

pub fn get_settings() -> Result<Settings> {

    let settings = if Path::new(LOCAL_SETTINGS).exists() {
        debug!("Found local settings!");
        Settings::parse(fs::read_to_string(LOCAL_SETTINGS)?.as_str())?
    } else {
        Settings::parse(DEFAULT_SETTINGS)?
    };

    Ok(settings)
}

pub fn drop_settings() -> Result<()> {

    if !Path::new(LOCAL_SETTINGS).exists() {
        fs::File::create(LOCAL_SETTINGS)?.write_all(DEFAULT_SETTINGS.as_bytes())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_ignores_depth() {
        let distance = calculate_distance(Vec3::new(0.0, 0.0, 900.0), Vec3::new(3.0, 4.0, -10.0));
        assert_eq!(distance, 5.0);
    }

    #[test]
    fn move_towards_takes_a_bounded_step() {
        let next = move_towards(Vec2::ZERO, Vec2::new(10.0, 0.0), 4.0);
        assert_eq!(next, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn move_towards_never_overshoots() {
        let target = Vec2::new(3.0, 4.0);
        assert_eq!(move_towards(Vec2::ZERO, target, 100.0), target);
        assert_eq!(move_towards(target, target, 1.0), target);
    }

    #[test]
    fn embedded_settings_are_valid() {
        let settings = Settings::parse(DEFAULT_SETTINGS).unwrap();
        assert!(settings.emf.red_range < settings.emf.yellow_range);
        assert!(settings.player.lives > 0);
    }

    #[test]
    fn inverted_emf_ranges_are_rejected() {
        let raw = "[emf]\nred_range = 200.0\nyellow_range = 100.0\n[player]\nspeed = 1.0\nlives = 3\n";
        assert!(Settings::parse(raw).is_err());
    }

    #[test]
    fn level_section_is_optional() {
        let raw = "[emf]\nred_range = 10.0\nyellow_range = 20.0\n[player]\nspeed = 1.0\nlives = 3\n";
        let settings = Settings::parse(raw).unwrap();
        assert!(settings.level.custom_path.is_none());
    }

    #[test]
    fn overlapping_boxes_collide() {
        assert!(check_collision(Vec3::ZERO, Vec2::splat(10.0), Vec3::new(5.0, 0.0, 0.0), Vec2::splat(10.0)));
        assert!(!check_collision(Vec3::ZERO, Vec2::splat(10.0), Vec3::new(50.0, 0.0, 0.0), Vec2::splat(10.0)));
    }
}
