use bevy::prelude::*;

use super::{map::SpawnPoint, util::Settings, FrameDelta, GameSet, LevelReset, PLAYER_SIZE};

const PLAYER_COLOR: Color = Color::rgb(0.95, 0.85, 0.3);
const PLAYER_DEPTH: f32 = 900.0;

pub struct Player;

impl Plugin for Player {
    fn build(&self, app: &mut App) {
        app
        .add_startup_system(Player::new)
        .add_system(PlayerMovement::r#move.in_set(GameSet::Player))
        .add_system(PlayerMovement::tick.in_set(GameSet::Player).after(PlayerMovement::r#move))
        .add_system(Player::respawn.in_set(GameSet::Player).after(PlayerMovement::tick))

        ;
    }
}

impl Player {
    pub fn new(mut commands: Commands, settings: Res<Settings>, spawn: Query<&Transform, With<SpawnPoint>>) {
        let translation = match spawn.get_single() {
            Ok(spawn) => spawn.translation.truncate().extend(PLAYER_DEPTH),
            Err(_) => {
                warn!("Level has no spawn point, using the origin");
                Vec3::new(0.0, 0.0, PLAYER_DEPTH)
            },
        };

        commands.spawn(SpriteBundle {
            sprite: Sprite {
                color: PLAYER_COLOR,
                custom_size: Some(Vec2::splat(PLAYER_SIZE)),
                ..Default::default()
            },
            transform: Transform::from_translation(translation),
            ..Default::default()
        }).insert(Name::new("player"))
            .insert(TrackedPlayer)
            .insert(PlayerMovement { direction: Vec2::ZERO, speed: settings.player.speed })
            .insert(PlayerData { lives: settings.player.lives })

            ;

        info!("Player Ready!");
    }

    /// Puts the player back on the spawn point when the level restarts
    pub fn respawn(
        mut resets: EventReader<LevelReset>,
        spawn: Query<&Transform, (With<SpawnPoint>, Without<TrackedPlayer>)>,
        mut player: Query<(&mut Transform, &mut PlayerMovement), With<TrackedPlayer>>,
    ) {
        if resets.iter().count() == 0 {
            return;
        }

        let (mut transform, mut movement) = match player.get_single_mut() {
            Ok(player) => player,
            Err(_) => return,
        };

        if let Ok(spawn) = spawn.get_single() {
            transform.translation = spawn.translation.truncate().extend(transform.translation.z);
        }
        movement.direction = Vec2::ZERO;
    }
}

/// The entity ghosts chase and measure their distance to
#[derive(Debug, Clone, Copy, Component, Reflect, FromReflect, Default)]
#[reflect(Component)]
pub struct TrackedPlayer;

#[derive(Component, Reflect, FromReflect, Default)]
#[reflect(Component)]
pub struct PlayerMovement {
    pub direction: Vec2,
    pub speed: f32,
}

impl PlayerMovement {
    pub fn r#move(
        mut player: Query<&mut PlayerMovement>,
        keyboard: Res<Input<KeyCode>>
    ) {
        let mut movement = match player.get_single_mut() {
            Ok(movement) => movement,
            Err(_) => return,
        };

        let mut direction = Vec2::ZERO;

        if keyboard.pressed(KeyCode::W) || keyboard.pressed(KeyCode::Up) {
            direction.y += 1.0;
        }

        if keyboard.pressed(KeyCode::S) || keyboard.pressed(KeyCode::Down) {
            direction.y -= 1.0;
        }

        if keyboard.pressed(KeyCode::A) || keyboard.pressed(KeyCode::Left) {
            direction.x -= 1.0;
        }

        if keyboard.pressed(KeyCode::D) || keyboard.pressed(KeyCode::Right) {
            direction.x += 1.0;
        }

        movement.direction = direction.normalize_or_zero();
    }

    pub fn tick(delta: Res<FrameDelta>, mut query: Query<(&PlayerMovement, &mut Transform)>) {
        for (movement, mut transform) in &mut query {
            let step = movement.direction * movement.speed * delta.0;
            transform.translation += step.extend(0.0);
        }
    }
}

#[derive(Component, Reflect, FromReflect, Default)]
#[reflect(Component)]
pub struct PlayerData {
    pub lives: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_walks_at_its_speed() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(FrameDelta(0.5))
            .add_system(PlayerMovement::tick);

        let player = app.world.spawn((
            Transform::from_xyz(0.0, 0.0, PLAYER_DEPTH),
            PlayerMovement { direction: Vec2::new(1.0, 0.0), speed: 100.0 },
        )).id();

        app.update();

        assert_eq!(app.world.get::<Transform>(player).unwrap().translation, Vec3::new(50.0, 0.0, PLAYER_DEPTH));
    }

    #[test]
    fn respawn_returns_player_to_spawn_point() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<LevelReset>()
            .add_system(Player::respawn);

        app.world.spawn((Transform::from_xyz(10.0, 20.0, 100.0), SpawnPoint));
        let player = app.world.spawn((
            Transform::from_xyz(-50.0, 3.0, PLAYER_DEPTH),
            TrackedPlayer,
            PlayerMovement { direction: Vec2::X, speed: 1.0 },
        )).id();

        app.world.resource_mut::<Events<LevelReset>>().send(LevelReset);
        app.update();

        assert_eq!(app.world.get::<Transform>(player).unwrap().translation, Vec3::new(10.0, 20.0, PLAYER_DEPTH));
        assert_eq!(app.world.get::<PlayerMovement>(player).unwrap().direction, Vec2::ZERO);
    }
}
