use bevy::prelude::*;
use bevy::reflect::FromReflect;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::game::map::{ReferenceId, ReferenceTable};

use super::util::{GhostBehavior, GhostMode, TierAlpha};

/// Lowest speed / sight range a designer can dial in
pub const MIN_TUNABLE: f32 = 0.001;

pub const DEFAULT_SIGHT_RANGE: f32 = 150.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GhostConfigError {
    #[error("unknown ghost type \"{0}\", expected \"Follow\" or \"Patrol\"")]
    UnknownGhostType(String),
    #[error("patrol ghost has no point {0} reference")]
    MissingPatrolPoint(char),
    #[error("patrol point {point} references unknown entity {id}")]
    UnresolvedPatrolPoint { point: char, id: u64 },
    #[error("malformed ghost record: {0}")]
    Malformed(String),
}

/// Flat key-value record as stored in level files.
/// Every key is optional, absent keys leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GhostRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghost_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghost_speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stun_lifetime: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stun_alpha: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_alpha: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yellow_alpha: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_alpha: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sight_range: Option<f32>,
    #[serde(rename = "pointAReferenceID", skip_serializing_if = "Option::is_none")]
    pub point_a_reference_id: Option<u64>,
    #[serde(rename = "pointBReferenceID", skip_serializing_if = "Option::is_none")]
    pub point_b_reference_id: Option<u64>,
}

/// Designer-facing ghost settings, editable in the inspector
#[derive(Component, Debug, Clone, PartialEq, Reflect, FromReflect)]
#[reflect(Component)]
pub struct GhostConfig {
    pub enabled: bool,
    pub mode: GhostMode,
    pub speed: f32,
    pub stun_lifetime: f32,
    pub alpha: TierAlpha,

    // --- Follow ---
    pub sight_range: f32,

    // --- Patrol ---
    pub point_a: Option<ReferenceId>,
    pub point_b: Option<ReferenceId>,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: GhostMode::Follow,
            speed: 1.0,
            stun_lifetime: 3.0,
            alpha: TierAlpha::default(),
            sight_range: DEFAULT_SIGHT_RANGE,
            point_a: None,
            point_b: None,
        }
    }
}

impl GhostConfig {
    /// Reads a record over the current values. Call `init` afterwards.
    pub fn deserialize(&mut self, value: &Value) -> Result<(), GhostConfigError> {
        if value.is_null() {
            return Ok(());
        }

        let record = GhostRecord::deserialize(value)
            .map_err(|e| GhostConfigError::Malformed(e.to_string()))?;

        self.apply(&record)
    }

    pub fn apply(&mut self, record: &GhostRecord) -> Result<(), GhostConfigError> {
        // Parse first so a bad mode leaves the config untouched
        let mode = match &record.ghost_type {
            Some(raw) => raw.parse::<GhostMode>()?,
            None => self.mode,
        };

        self.mode = mode;
        if let Some(enabled) = record.enabled { self.enabled = enabled }
        if let Some(speed) = record.ghost_speed { self.speed = speed }
        if let Some(lifetime) = record.stun_lifetime { self.stun_lifetime = lifetime }
        if let Some(alpha) = record.stun_alpha { self.alpha.stun = alpha }
        if let Some(alpha) = record.red_alpha { self.alpha.red = alpha }
        if let Some(alpha) = record.yellow_alpha { self.alpha.yellow = alpha }
        if let Some(alpha) = record.green_alpha { self.alpha.green = alpha }
        if let Some(range) = record.sight_range { self.sight_range = range }
        if let Some(id) = record.point_a_reference_id { self.point_a = Some(ReferenceId(id)) }
        if let Some(id) = record.point_b_reference_id { self.point_b = Some(ReferenceId(id)) }

        Ok(())
    }

    pub fn to_record(&self) -> GhostRecord {
        GhostRecord {
            enabled: Some(self.enabled),
            ghost_type: Some(self.mode.to_string()),
            ghost_speed: Some(self.speed),
            stun_lifetime: Some(self.stun_lifetime),
            stun_alpha: Some(self.alpha.stun),
            red_alpha: Some(self.alpha.red),
            yellow_alpha: Some(self.alpha.yellow),
            green_alpha: Some(self.alpha.green),
            sight_range: Some(self.sight_range),
            point_a_reference_id: self.point_a.map(|id| id.0),
            point_b_reference_id: self.point_b.map(|id| id.0),
        }
    }

    pub fn serialize(&self) -> Value {
        // A record of plain options and numbers always converts
        serde_json::to_value(self.to_record()).unwrap_or(Value::Null)
    }

    /// Pulls degenerate tunables back into range, true if anything changed
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;

        if !(self.speed >= MIN_TUNABLE) {
            warn!("Ghost speed {} is out of range, clamped to {}", self.speed, MIN_TUNABLE);
            self.speed = MIN_TUNABLE;
            changed = true;
        }

        if !(self.sight_range >= MIN_TUNABLE) {
            warn!("Ghost sight range {} is out of range, clamped to {}", self.sight_range, MIN_TUNABLE);
            self.sight_range = MIN_TUNABLE;
            changed = true;
        }

        if !(self.stun_lifetime >= 0.0) {
            warn!("Ghost stun lifetime {} is negative, clamped to 0", self.stun_lifetime);
            self.stun_lifetime = 0.0;
            changed = true;
        }

        changed
    }

    /// Post-load hook: clamps the tunables and resolves the movement strategy
    pub fn init(&mut self, references: &ReferenceTable) -> Result<GhostBehavior, GhostConfigError> {
        self.sanitize();
        self.resolve(references)
    }

    pub fn resolve(&self, references: &ReferenceTable) -> Result<GhostBehavior, GhostConfigError> {
        match self.mode {
            GhostMode::Follow => Ok(GhostBehavior::Follow { sight_range: self.sight_range }),
            GhostMode::Patrol => {
                let point_a = Self::check_point('A', self.point_a, references)?;
                let point_b = Self::check_point('B', self.point_b, references)?;
                Ok(GhostBehavior::Patrol { point_a, point_b })
            },
        }
    }

    fn check_point(point: char, id: Option<ReferenceId>, references: &ReferenceTable) -> Result<ReferenceId, GhostConfigError> {
        let id = id.ok_or(GhostConfigError::MissingPatrolPoint(point))?;

        if references.get(id).is_none() {
            return Err(GhostConfigError::UnresolvedPatrolPoint { point, id: id.0 });
        }

        Ok(id)
    }
}
