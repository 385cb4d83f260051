use bevy::prelude::*;

use crate::game::{Active, Collider, FrameDelta, GameSet, LevelReset, GHOST_SIZE};

use super::{map::ReferenceTable, player::TrackedPlayer, util::{calculate_distance, move_towards, EmfRanges}};

pub mod record;
pub mod util;

use record::GhostConfig;
use util::{classify_tier, patrol_progress, EmfTier, GhostBehavior, GhostParticle, TierAlpha};

const TRAIL_COLOR: Color = Color::rgba(0.7, 0.9, 1.0, 0.6);
const STUNNED_TRAIL_COLOR: Color = Color::rgba(0.4, 0.4, 1.0, 0.6);
const TRAIL_LENGTH: f32 = 1.0;
const FOLLOWING_TRAIL_LENGTH: f32 = 1.8;

/// Sent when something stuns a ghost, e.g. the player's flashlight
#[derive(Debug, Clone, Copy)]
pub struct StunGhost(pub Entity);

/// Marks the child sprite showing a ghost's particle trail
#[derive(Debug, Clone, Copy, Component)]
pub struct GhostTrail;

/// Runtime state of a ghost. Tunables live in `GhostConfig`.
#[derive(Debug, Clone, Component, Reflect, FromReflect, Default)]
#[reflect(Component)]
pub struct Ghost {
    pub behavior: GhostBehavior,
    pub is_stunned: bool,
    pub stun_timer: f32,
    pub patrol_time: f32,

    /// Position to reset to on level restart
    pub reset_position: Vec3,
    pub tier: EmfTier,
    pub particle: GhostParticle,
}

/// The engine components a ghost drives each frame
pub struct GhostBody<'a> {
    pub transform: &'a mut Transform,
    pub collider: &'a mut Collider,
    pub sprite: &'a mut Sprite,
    pub visibility: &'a mut Visibility,
}

/// What a ghost can see this frame
#[derive(Debug, Clone, Copy)]
pub struct Surroundings {
    pub player: Vec3,
    /// World positions of the patrol markers, None when they can't be found
    pub patrol_points: Option<(Vec3, Vec3)>,
    pub emf: EmfRanges,
}

impl Ghost {
    pub fn new(behavior: GhostBehavior, reset_position: Vec3) -> Self {
        Self {
            behavior,
            reset_position,
            particle: GhostParticle { following: false, ..Default::default() },
            ..Default::default()
        }
    }

    /// Advances the ghost by one frame
    pub fn tick(&mut self, config: &GhostConfig, dt: f32, body: &mut GhostBody, around: &Surroundings) {
        let stunned_frame = self.is_stunned;

        if self.is_stunned {
            body.collider.enabled = false;

            self.stun_timer += dt;

            if self.stun_timer >= config.stun_lifetime {
                self.recover(&config.alpha, body);
            }
        } else {
            body.collider.enabled = true;

            match self.behavior {
                GhostBehavior::Follow { sight_range } => {
                    Self::chase(config.speed, sight_range, dt, body.transform, around.player);
                    self.particle.set_following(true);
                },
                GhostBehavior::Patrol { .. } => {
                    match around.patrol_points {
                        Some((point_a, point_b)) => self.patrol(config.speed, body.transform, point_a, point_b),
                        None => debug!("Patrol points are missing, holding position"),
                    }
                    self.patrol_time += dt;
                },
            }
        }

        // The recovery frame keeps its residual look, proximity resumes next frame
        if self.is_stunned {
            self.show_tier(EmfTier::Stunned, &config.alpha, body);
        } else if !stunned_frame {
            self.update_look(&config.alpha, body, around);
        }
    }

    /// Disables the ghost for `stun_lifetime` seconds, restarting the timer if already stunned
    pub fn stun(&mut self, config: &GhostConfig, body: &mut GhostBody) {
        self.is_stunned = true;
        self.particle.stunned = true;
        self.stun_timer = 0.0;
        body.collider.enabled = false;
        self.show_tier(EmfTier::Stunned, &config.alpha, body);
    }

    /// Puts the ghost back to its creation state for a level restart
    pub fn reset(&mut self, config: &GhostConfig, body: &mut GhostBody, active: &mut Active, around: &Surroundings) {
        self.patrol_time = 0.0;
        body.transform.translation = self.reset_position;
        self.is_stunned = false;
        self.stun_timer = 0.0;
        self.particle.stunned = false;
        body.collider.enabled = true;

        if !active.0 {
            active.0 = true;
        }

        self.update_look(&config.alpha, body, around);
    }

    fn recover(&mut self, alpha: &TierAlpha, body: &mut GhostBody) {
        self.is_stunned = false;
        self.particle.stunned = false;
        self.stun_timer = 0.0;

        // White at the stunned alpha for this one frame
        *body.visibility = Visibility::Visible;
        body.sprite.color = Color::rgba(1.0, 1.0, 1.0, alpha.stun);
        body.collider.enabled = true;

        info!("A ghost shook off its stun");
    }

    fn chase(speed: f32, sight_range: f32, dt: f32, transform: &mut Transform, player: Vec3) {
        let my_pos = transform.translation;
        let distance = calculate_distance(player, my_pos);

        if distance < sight_range {
            let destination = move_towards(my_pos.truncate(), player.truncate(), speed * dt);
            transform.translation = destination.extend(player.z);
        }
    }

    fn patrol(&self, speed: f32, transform: &mut Transform, point_a: Vec3, point_b: Vec3) {
        let progress = patrol_progress(self.patrol_time, speed);
        let destination = point_a.truncate().lerp(point_b.truncate(), progress);
        transform.translation = destination.extend(transform.translation.z);
    }

    fn update_look(&mut self, alpha: &TierAlpha, body: &mut GhostBody, around: &Surroundings) {
        if self.is_stunned {
            self.show_tier(EmfTier::Stunned, alpha, body);
        } else {
            let distance = calculate_distance(body.transform.translation, around.player);
            self.show_tier(classify_tier(distance, &around.emf), alpha, body);
        }
    }

    fn show_tier(&mut self, tier: EmfTier, alpha: &TierAlpha, body: &mut GhostBody) {
        self.tier = tier;

        *body.visibility = if tier.sprite_visible() { Visibility::Visible } else { Visibility::Hidden };
        body.sprite.color = Color::rgba(1.0, 1.0, 1.0, alpha.for_tier(tier));

        match tier {
            EmfTier::Red | EmfTier::Yellow => self.particle.set_active(true),
            EmfTier::Green => self.particle.set_active(false),
            EmfTier::Stunned => {},
        }
    }
}

/// Looks up a patrol marker's position through the reference table
fn patrol_points(behavior: &GhostBehavior, references: &ReferenceTable, landmarks: &Query<&Transform, Without<Ghost>>) -> Option<(Vec3, Vec3)> {
    match behavior {
        GhostBehavior::Patrol { point_a, point_b } => {
            let locate = |id| references.get(id).and_then(|entity| landmarks.get(entity).ok()).map(|t| t.translation);
            locate(*point_a).zip(locate(*point_b))
        },
        GhostBehavior::Follow { .. } => None,
    }
}

pub struct GhostPlugin;

impl Plugin for GhostPlugin {
    fn build(&self, app: &mut App) {
        app
            .add_event::<StunGhost>()
            .add_system(Self::refresh_behavior.before(GameSet::Ghosts))
            .add_systems((Self::handle_resets, Self::tick_ghosts, Self::handle_stuns, Self::sync_trails).chain().in_set(GameSet::Ghosts))

        ;
    }
}

impl GhostPlugin {
    /// Spawns a ghost and its trail, capturing `position` as the reset pose
    pub fn spawn_ghost(commands: &mut Commands, name: &str, position: Vec3, config: GhostConfig, behavior: GhostBehavior) -> Entity {
        let ghost = commands.spawn(SpriteBundle {
            sprite: Sprite {
                color: Color::rgba(1.0, 1.0, 1.0, config.alpha.green),
                custom_size: Some(Vec2::splat(GHOST_SIZE)),
                ..Default::default()
            },
            transform: Transform::from_translation(position),
            visibility: Visibility::Hidden,
            ..Default::default()
        })
        .insert(Name::new(name.to_string()))
        .insert(Ghost::new(behavior, position))
        .insert(config)
        .insert(Collider::default())
        .insert(Active(true))
        .with_children(|parent| {
            parent.spawn(SpriteBundle {
                sprite: Sprite {
                    color: TRAIL_COLOR,
                    custom_size: Some(Vec2::new(GHOST_SIZE * 0.5, GHOST_SIZE * 0.25)),
                    ..Default::default()
                },
                transform: Transform::from_xyz(0.0, -GHOST_SIZE * 0.6, -1.0),
                visibility: Visibility::Hidden,
                ..Default::default()
            })
            .insert(Name::new(format!("{} Trail", name)))
            .insert(GhostTrail);
        })
        .id();

        info!("{} is haunting the level!", name);

        ghost
    }

    /// Re-runs the post-load hook whenever a config changes (inspector edits included)
    pub fn refresh_behavior(
        mut ghosts: Query<(&mut GhostConfig, &mut Ghost, Option<&Name>), Changed<GhostConfig>>,
        references: Res<ReferenceTable>,
    ) {
        for (mut config, mut ghost, name) in &mut ghosts {
            let name = name.map(|n| n.as_str()).unwrap_or("ghost");

            match config.init(&references) {
                Ok(behavior) => {
                    if ghost.behavior != behavior {
                        debug!("{} now uses {:?}", name, behavior);
                        ghost.behavior = behavior;
                    }
                },
                Err(e) => warn!("Keeping the previous behavior of {}: {}", name, e),
            }
        }
    }

    pub fn tick_ghosts(
        delta: Res<FrameDelta>,
        emf: Res<EmfRanges>,
        references: Res<ReferenceTable>,
        player: Query<Entity, With<TrackedPlayer>>,
        landmarks: Query<&Transform, Without<Ghost>>,
        mut ghosts: Query<(&mut Ghost, &GhostConfig, &mut Transform, &mut Collider, &mut Sprite, &mut Visibility, &Active)>,
    ) {
        let player_pos = match player.get_single().ok().and_then(|player| landmarks.get(player).ok()) {
            Some(transform) => transform.translation,
            None => return,
        };

        for (mut ghost, config, mut transform, mut collider, mut sprite, mut visibility, active) in &mut ghosts {
            if !active.0 {
                *visibility = Visibility::Hidden;
                continue;
            }

            if !config.enabled {
                continue;
            }

            let around = Surroundings {
                player: player_pos,
                patrol_points: patrol_points(&ghost.behavior, &references, &landmarks),
                emf: *emf,
            };

            let mut body = GhostBody {
                transform: &mut transform,
                collider: &mut collider,
                sprite: &mut sprite,
                visibility: &mut visibility,
            };

            ghost.tick(config, delta.0, &mut body, &around);
        }
    }

    pub fn handle_stuns(
        mut stuns: EventReader<StunGhost>,
        mut ghosts: Query<(&mut Ghost, &GhostConfig, &mut Transform, &mut Collider, &mut Sprite, &mut Visibility)>,
    ) {
        for StunGhost(entity) in stuns.iter() {
            match ghosts.get_mut(*entity) {
                Ok((mut ghost, config, mut transform, mut collider, mut sprite, mut visibility)) => {
                    let mut body = GhostBody {
                        transform: &mut transform,
                        collider: &mut collider,
                        sprite: &mut sprite,
                        visibility: &mut visibility,
                    };

                    ghost.stun(config, &mut body);
                    info!("Ghost {:?} is stunned!", entity);
                },
                Err(_) => warn!("Tried to stun {:?} but it is not a ghost", entity),
            }
        }
    }

    pub fn handle_resets(
        mut resets: EventReader<LevelReset>,
        emf: Res<EmfRanges>,
        references: Res<ReferenceTable>,
        player: Query<Entity, With<TrackedPlayer>>,
        landmarks: Query<&Transform, Without<Ghost>>,
        mut ghosts: Query<(&mut Ghost, &GhostConfig, &mut Transform, &mut Collider, &mut Sprite, &mut Visibility, &mut Active)>,
    ) {
        if resets.iter().count() == 0 {
            return;
        }

        let player_pos = player.get_single().ok()
            .and_then(|player| landmarks.get(player).ok())
            .map(|transform| transform.translation)
            .unwrap_or(Vec3::ZERO);

        for (mut ghost, config, mut transform, mut collider, mut sprite, mut visibility, mut active) in &mut ghosts {
            let around = Surroundings {
                player: player_pos,
                patrol_points: patrol_points(&ghost.behavior, &references, &landmarks),
                emf: *emf,
            };

            let mut body = GhostBody {
                transform: &mut transform,
                collider: &mut collider,
                sprite: &mut sprite,
                visibility: &mut visibility,
            };

            ghost.reset(config, &mut body, &mut active, &around);
        }

        info!("Ghosts reset!");
    }

    /// Mirrors each ghost's particle state onto its trail sprite
    pub fn sync_trails(
        ghosts: Query<(&Ghost, &Children)>,
        mut trails: Query<(&mut Visibility, &mut Sprite, &mut Transform), (With<GhostTrail>, Without<Ghost>)>,
    ) {
        for (ghost, children) in &ghosts {
            for &child in children.iter() {
                if let Ok((mut visibility, mut sprite, mut transform)) = trails.get_mut(child) {
                    let particle = ghost.particle;

                    *visibility = if particle.active { Visibility::Visible } else { Visibility::Hidden };
                    sprite.color = if particle.stunned { STUNNED_TRAIL_COLOR } else { TRAIL_COLOR };
                    transform.scale.x = if particle.following { FOLLOWING_TRAIL_LENGTH } else { TRAIL_LENGTH };
                }
            }
        }
    }
}
