use bevy::prelude::*;
use bevy_inspector_egui::quick::WorldInspectorPlugin;

use crate::game::{
    enemy::{record::GhostConfig, util::{EmfTier, GhostBehavior, GhostMode, GhostParticle, TierAlpha}, Ghost},
    map::ReferenceId,
    player::{PlayerData, PlayerMovement, TrackedPlayer},
    util::EmfRanges,
    Active, Collider,
};

/// Live editing of ghost tunables, debug builds only.
/// Config edits are clamped and re-resolved by `GhostPlugin::refresh_behavior`.
pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        if cfg!(debug_assertions) {
            info!("Debug Enabled");
            app.add_plugin(WorldInspectorPlugin::new())
                .register_type::<Ghost>()
                .register_type::<GhostConfig>()
                .register_type::<GhostBehavior>()
                .register_type::<GhostMode>()
                .register_type::<GhostParticle>()
                .register_type::<TierAlpha>()
                .register_type::<EmfTier>()
                .register_type::<ReferenceId>()
                .register_type::<EmfRanges>()
                .register_type::<Collider>()
                .register_type::<Active>()
                .register_type::<TrackedPlayer>()
                .register_type::<PlayerMovement>()
                .register_type::<PlayerData>()
                .add_system(Self::dump_ghosts)

            ;
        }
    }
}

impl DebugPlugin {
    /// F5 prints every ghost as a level record, handy after tuning in the inspector
    pub fn dump_ghosts(keyboard: Res<Input<KeyCode>>, ghosts: Query<(&Name, &Transform, &GhostConfig), With<Ghost>>) {
        if !keyboard.just_pressed(KeyCode::F5) {
            return;
        }

        for (name, transform, config) in &ghosts {
            info!("{} at {:?}: {}", name, transform.translation.truncate(), config.serialize());
        }
    }
}
