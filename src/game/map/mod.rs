use std::{fs, path::Path};

use bevy::prelude::*;
use bevy::utils::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::enemy::{record::GhostConfig, GhostPlugin};
use super::util::Settings;

const DEFAULT_LEVEL: &str = include_str!("../../assets/level.json");

const GHOST_DEPTH: f32 = 800.0;
const MARKER_DEPTH: f32 = 100.0;

/// Opaque id other entities use to point at this one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Component, Reflect, FromReflect, Default)]
#[reflect(Component)]
pub struct ReferenceId(pub u64);

/// Resolves `ReferenceId`s to live entities. Entries never own the entity.
#[derive(Debug, Default, Resource)]
pub struct ReferenceTable {
    entities: HashMap<ReferenceId, Entity>,
}

impl ReferenceTable {
    pub fn insert(&mut self, id: ReferenceId, entity: Entity) -> Option<Entity> {
        self.entities.insert(id, entity)
    }

    pub fn get(&self, id: ReferenceId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

#[derive(Component, )]
pub struct SpawnPoint;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerData {
    pub reference_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub position: [f32; 2],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostData {
    #[serde(default)]
    pub name: Option<String>,
    pub position: [f32; 2],
    /// Flat ghost record, see `GhostRecord`
    #[serde(default)]
    pub components: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    pub player_spawn: [f32; 2],
    #[serde(default)]
    pub markers: Vec<MarkerData>,
    #[serde(default)]
    pub ghosts: Vec<GhostData>,
}

impl LevelData {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Level file is not valid")
    }
}

#[derive(Debug, )]
pub struct LevelMap;

impl Plugin for LevelMap {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<ReferenceTable>()
            .add_startup_system(LevelMap::create_level.in_base_set(StartupSet::PreStartup))

        ;
    }
}

impl LevelMap {
    pub fn get_level(settings: &Settings) -> Result<String> {
        match &settings.level.custom_path {
            Some(path) if Path::new(path).exists() => {
                debug!("Found Custom Level!");
                fs::read_to_string(path).with_context(|| format!("Could not read level {}", path))
            },
            Some(path) => {
                warn!("Custom level {} is missing, using the default level", path);
                Ok(DEFAULT_LEVEL.to_string())
            },
            None => Ok(DEFAULT_LEVEL.to_string()),
        }
    }

    /// Creates the level from its JSON description
    pub fn create_level(mut commands: Commands, settings: Res<Settings>, mut references: ResMut<ReferenceTable>) {
        info!("Attempting level creation");

        let level = match Self::get_level(&settings).and_then(|raw| LevelData::parse(&raw)) {
            Ok(level) => level,
            Err(e) => {
                error!("An error occured when loading the level: {:#}", e);
                return;
            },
        };

        Self::build_level(&mut commands, &mut references, &level);
    }

    /// Spawns the level, returns how many ghosts made it in
    pub fn build_level(commands: &mut Commands, references: &mut ReferenceTable, level: &LevelData) -> usize {
        let [x, y] = level.player_spawn;
        commands.spawn(SpatialBundle {
            visibility: Visibility::Hidden,
            transform: Transform::from_xyz(x, y, MARKER_DEPTH),
            ..Default::default()
        })
        .insert(Name::new("Spawn Point"))
        .insert(SpawnPoint);

        // Markers first, ghosts validate their patrol points against them
        for marker in &level.markers {
            let [x, y] = marker.position;
            let id = ReferenceId(marker.reference_id);
            let name = marker.name.clone().unwrap_or_else(|| format!("Marker ({})", marker.reference_id));

            let entity = commands.spawn(SpatialBundle {
                visibility: Visibility::Hidden,
                transform: Transform::from_xyz(x, y, MARKER_DEPTH),
                ..Default::default()
            })
            .insert(Name::new(name))
            .insert(id)
            .id();

            if references.insert(id, entity).is_some() {
                warn!("Reference id {} is used twice, the last marker wins", id.0);
            }
        }

        let mut spawned = 0;
        for (index, ghost) in level.ghosts.iter().enumerate() {
            let name = ghost.name.clone().unwrap_or_else(|| format!("Ghost ({})", index));

            let mut config = GhostConfig::default();
            let behavior = config.deserialize(&ghost.components).and_then(|_| config.init(references));

            match behavior {
                Ok(behavior) => {
                    let [x, y] = ghost.position;
                    GhostPlugin::spawn_ghost(commands, &name, Vec3::new(x, y, GHOST_DEPTH), config, behavior);
                    spawned += 1;
                },
                Err(e) => error!("{} was not spawned: {}", name, e),
            }
        }

        info!("Level ready with {} markers and {}/{} ghosts", references.len(), spawned, level.ghosts.len());

        spawned
    }
}
