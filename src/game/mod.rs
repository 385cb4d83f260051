use bevy::prelude::*;

use self::{enemy::{Ghost, StunGhost}, player::{PlayerData, TrackedPlayer}, util::{calculate_distance, check_collision, EmfRanges, Settings}};

pub mod player;
pub mod enemy;
pub mod map;
pub mod util;

pub const PLAYER_SIZE: f32 = 24.0;
pub const GHOST_SIZE: f32 = 32.0;

pub fn camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
    info!("Spawned Camera");
}

/// Seconds since the last frame, read by the simulation instead of `Time`
#[derive(Debug, Clone, Copy, Default, Resource)]
pub struct FrameDelta(pub f32);

/// Entity level on/off switch, inactive entities are not simulated
#[derive(Debug, Clone, Copy, Component, Reflect, FromReflect)]
#[reflect(Component)]
pub struct Active(pub bool);

impl Default for Active {
    fn default() -> Self {
        Self(true)
    }
}

/// Square collision volume that can be toggled off
#[derive(Debug, Clone, Copy, Component, Reflect, FromReflect)]
#[reflect(Component)]
pub struct Collider {
    pub enabled: bool,
}

impl Default for Collider {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Frame ordering: ghosts read the player's position after it moved
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Player,
    Ghosts,
}

/// Level restart, everything goes back to its starting state
#[derive(Debug, Clone, Copy)]
pub struct LevelReset;

#[derive(Debug, )]
pub struct GameController;

impl Plugin for GameController {
    fn build(&self, app: &mut App) {
        app
            .add_event::<LevelReset>()
            .init_resource::<FrameDelta>()
            .configure_set(GameSet::Ghosts.after(GameSet::Player))
            .add_system(Self::sync_frame_delta.in_base_set(CoreSet::PreUpdate))
            .add_system(Self::restart_on_key.in_set(GameSet::Player))
            .add_system(Self::flashlight.in_set(GameSet::Player))
            .add_system(Self::ghost_contact.after(GameSet::Ghosts))

        ;
    }
}

impl GameController {
    pub fn sync_frame_delta(time: Res<Time>, mut delta: ResMut<FrameDelta>) {
        delta.0 = time.delta_seconds();
    }

    pub fn restart_on_key(keyboard: Res<Input<KeyCode>>, mut resets: EventWriter<LevelReset>) {
        if keyboard.just_pressed(KeyCode::R) {
            info!("Restarting level");
            resets.send(LevelReset);
        }
    }

    /// Stuns every ghost in red range of the player
    pub fn flashlight(
        keyboard: Res<Input<KeyCode>>,
        emf: Res<EmfRanges>,
        player: Query<&Transform, With<TrackedPlayer>>,
        ghosts: Query<(Entity, &Transform, &Active), (With<Ghost>, Without<TrackedPlayer>)>,
        mut stuns: EventWriter<StunGhost>,
    ) {
        if !keyboard.just_pressed(KeyCode::Space) {
            return;
        }

        let player = match player.get_single() {
            Ok(player) => player,
            Err(_) => return,
        };

        debug!("Flashlight!");

        for (entity, transform, active) in &ghosts {
            if active.0 && calculate_distance(player.translation, transform.translation) <= emf.red_range {
                stuns.send(StunGhost(entity));
            }
        }
    }

    /// A ghost with an enabled collider catches the player
    pub fn ghost_contact(
        settings: Res<Settings>,
        mut player: Query<(&Transform, &mut PlayerData), With<TrackedPlayer>>,
        ghosts: Query<(&Transform, &Collider, &Active), (With<Ghost>, Without<TrackedPlayer>)>,
        mut resets: EventWriter<LevelReset>,
    ) {
        let (player_transform, mut data) = match player.get_single_mut() {
            Ok(player) => player,
            Err(_) => return,
        };

        let caught = ghosts.iter().any(|(transform, collider, active)| {
            active.0 && collider.enabled && check_collision(player_transform.translation, Vec2::splat(PLAYER_SIZE), transform.translation, Vec2::splat(GHOST_SIZE))
        });

        if caught {
            data.lives = data.lives.saturating_sub(1);

            if data.lives == 0 {
                warn!("Out of lives! Starting over");
                data.lives = settings.player.lives;
            } else {
                info!("Caught by a ghost! {} lives left", data.lives);
            }

            resets.send(LevelReset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{enemy::{record::GhostConfig, util::GhostBehavior}, util::{LevelSettings, PlayerSettings}};

    fn test_settings() -> Settings {
        Settings {
            emf: EmfRanges::default(),
            player: PlayerSettings { speed: 100.0, lives: 3 },
            level: LevelSettings::default(),
        }
    }

    fn contact_app(collider_enabled: bool) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<LevelReset>()
            .insert_resource(test_settings())
            .add_system(GameController::ghost_contact);

        app.world.spawn((Transform::default(), TrackedPlayer, PlayerData { lives: 2 }));
        app.world.spawn((
            Transform::from_xyz(5.0, 0.0, 0.0),
            Ghost::new(GhostBehavior::default(), Vec3::ZERO),
            GhostConfig::default(),
            Collider { enabled: collider_enabled },
            Active(true),
        ));
        app
    }

    fn lives(app: &mut App) -> u64 {
        app.world.query::<&PlayerData>().single(&app.world).lives
    }

    #[test]
    fn touching_a_ghost_costs_a_life() {
        let mut app = contact_app(true);
        app.update();

        assert_eq!(lives(&mut app), 1);
        assert!(!app.world.resource::<Events<LevelReset>>().is_empty());
    }

    #[test]
    fn stunned_ghost_is_harmless() {
        let mut app = contact_app(false);
        app.update();

        assert_eq!(lives(&mut app), 2);
        assert!(app.world.resource::<Events<LevelReset>>().is_empty());
    }

    #[test]
    fn last_life_restarts_the_run() {
        let mut app = contact_app(true);
        app.update();
        app.update();

        assert_eq!(lives(&mut app), 3);
    }
}
