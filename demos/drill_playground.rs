//! Drill Playground Example
//!
//! Two rooms of terrain to walk, jump and drill through:
//! - A thick floor to drill into from a high ledge
//! - A bounce pad that throws the player back up
//! - A lava pit in the second room
//! - A checkpoint on the far side of the pit
//!
//! ## Controls
//! - **A/D** or **Left/Right**: Move horizontally
//! - **W/Up/Space**: Jump
//! - **R**: Restart from the last checkpoint
//!
//! The camera moves room by room and the simulation pauses while it does.

use bevy::prelude::*;
use bevy::render::camera::ScalingMode;
use bevy::sprite::ColorMaterial;
use bevy_rapier2d::prelude::*;
use drill_character_controller::prelude::*;

// ==================== Constants ====================

const ROOM_SIZE: Vec2 = Vec2::new(24.0, 18.0);

const GROUND_GROUPS: Group = Group::GROUP_1;
const BOUNCE_GROUPS: Group = Group::GROUP_1.union(Group::GROUP_2);
const LAVA_GROUPS: Group = Group::GROUP_3;

fn spawn_position() -> Vec2 {
    Vec2::new(3.0, 12.0)
}

#[derive(Component)]
struct Player;

/// Visual child that turns with [`MotionPresentation::sprite_up`].
#[derive(Component)]
struct PlayerSprite;

/// Full-screen overlay driven by the reload sweep.
#[derive(Component)]
struct SweepOverlay;

// ==================== Main ====================

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Drill Playground - Drill Controller Example".into(),
                resolution: (1280.0, 960.0).into(),
                ..default()
            }),
            ..default()
        }))
        // Physics
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(RapierDebugRenderPlugin::default())
        // Drill controller
        .add_plugins(DrillControllerPlugin::<Rapier2dBackend>::default())
        .insert_resource(RoomGrid {
            cell_size: ROOM_SIZE,
            ..default()
        })
        // Systems
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                read_keyboard,
                turn_sprite,
                draw_sweep,
                log_effects,
                log_checkpoints,
            ),
        )
        .run();
}

// ==================== Setup ====================

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.spawn((
        Camera2d,
        Projection::from(OrthographicProjection {
            scaling_mode: ScalingMode::AutoMin {
                min_width: ROOM_SIZE.x,
                min_height: ROOM_SIZE.y,
            },
            ..OrthographicProjection::default_2d()
        }),
        RoomCamera::default(),
    ));

    spawn_terrain(&mut commands, &mut meshes, &mut materials);
    spawn_player(&mut commands, &mut meshes, &mut materials);

    commands.spawn((
        Checkpoint::new("far side", Vec2::new(1.0, 2.0)),
        Transform::from_xyz(44.0, 4.5, 0.0),
        Mesh2d(meshes.add(Rectangle::new(2.0, 4.0))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgba(0.9, 0.9, 0.3, 0.4)))),
    ));

    commands.spawn((
        SweepOverlay,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            ..default()
        },
        BackgroundColor(Color::NONE),
        Pickable::IGNORE,
    ));

    commands.spawn((
        Text::new("A/D: Move | W/Space: Jump | R: Restart"),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        Pickable::IGNORE,
    ));
}

fn spawn_terrain(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<ColorMaterial>>,
) {
    let dirt = Color::srgb(0.45, 0.32, 0.2);
    let rock = Color::srgb(0.3, 0.3, 0.3);

    // First room: high ledge over a thick drillable floor
    spawn_block(commands, meshes, materials, Vec2::new(3.0, 9.5), Vec2::new(3.0, 0.5), GROUND_GROUPS, dirt);
    spawn_block(commands, meshes, materials, Vec2::new(12.0, 1.5), Vec2::new(12.0, 1.5), GROUND_GROUPS, dirt);
    spawn_block(commands, meshes, materials, Vec2::new(12.0, -9.0), Vec2::new(12.0, 3.0), GROUND_GROUPS, rock);
    spawn_block(commands, meshes, materials, Vec2::new(-0.5, 9.0), Vec2::new(0.5, 9.0), GROUND_GROUPS, rock);

    // Bounce pad near the room edge
    spawn_block(
        commands,
        meshes,
        materials,
        Vec2::new(20.0, 3.25),
        Vec2::new(2.0, 0.25),
        BOUNCE_GROUPS,
        Color::srgb(0.3, 0.8, 0.4),
    );

    // Second room: lava pit between two floors
    spawn_block(commands, meshes, materials, Vec2::new(28.0, 1.5), Vec2::new(4.0, 1.5), GROUND_GROUPS, dirt);
    spawn_block(commands, meshes, materials, Vec2::new(44.0, 1.5), Vec2::new(4.0, 1.5), GROUND_GROUPS, dirt);
    spawn_block(commands, meshes, materials, Vec2::new(48.5, 9.0), Vec2::new(0.5, 9.0), GROUND_GROUPS, rock);

    let lava_half = Vec2::new(4.0, 1.0);
    commands.spawn((
        Transform::from_xyz(36.0, 1.0, 0.0),
        Collider::cuboid(lava_half.x, lava_half.y),
        Sensor,
        CollisionGroups::new(LAVA_GROUPS, Group::ALL),
        Mesh2d(meshes.add(Rectangle::from_size(lava_half * 2.0))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgb(0.9, 0.3, 0.05)))),
    ));
}

#[allow(clippy::too_many_arguments)]
fn spawn_block(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<ColorMaterial>>,
    position: Vec2,
    half_size: Vec2,
    groups: Group,
    color: Color,
) {
    commands.spawn((
        Transform::from_translation(position.extend(0.0)),
        RigidBody::Fixed,
        Collider::cuboid(half_size.x, half_size.y),
        CollisionGroups::new(groups, Group::ALL),
        Mesh2d(meshes.add(Rectangle::from_size(half_size * 2.0))),
        MeshMaterial2d(materials.add(ColorMaterial::from_color(color))),
    ));
}

fn spawn_player(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<ColorMaterial>>,
) {
    let config = DrillConfig::default();

    commands
        .spawn((
            Player,
            Transform::from_translation(spawn_position().extend(1.0)),
            config,
            Rapier2dDrillerBundle::for_config(&config),
            // Only collide with solid terrain; the probe handles lava itself
            CollisionGroups::new(Group::GROUP_10, GROUND_GROUPS),
            Visibility::default(),
        ))
        .with_children(|parent| {
            parent.spawn((
                PlayerSprite,
                Mesh2d(meshes.add(Triangle2d::new(
                    Vec2::new(0.0, config.body_radius),
                    Vec2::new(-config.body_radius, -config.body_radius),
                    Vec2::new(config.body_radius, -config.body_radius),
                ))),
                MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgb(0.2, 0.6, 0.9)))),
            ));
        });
}

// ==================== Systems ====================

fn read_keyboard(keys: Res<ButtonInput<KeyCode>>, mut q_player: Query<&mut MovementIntent, With<Player>>) {
    let Ok(mut intent) = q_player.single_mut() else {
        return;
    };

    let mut horizontal = 0.0;
    if keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        horizontal -= 1.0;
    }
    if keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        horizontal += 1.0;
    }
    intent.set_horizontal(horizontal);
    intent.set_jump_pressed(keys.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp, KeyCode::Space]));

    if keys.just_pressed(KeyCode::KeyR) {
        intent.request_reset();
    }
}

fn turn_sprite(
    q_player: Query<(&MotionPresentation, &Children), With<Player>>,
    mut q_sprite: Query<(&mut Transform, &mut Visibility), With<PlayerSprite>>,
) {
    for (presentation, children) in &q_player {
        let mut sprites = q_sprite.iter_many_mut(children);
        while let Some((mut transform, mut visibility)) = sprites.fetch_next() {
            transform.rotation = Quat::from_rotation_z(Vec2::Y.angle_to(presentation.sprite_up));
            visibility.set_if_neq(if presentation.visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            });
        }
    }
}

fn draw_sweep(reload: Res<SceneReload>, mut q_overlay: Query<&mut BackgroundColor, With<SweepOverlay>>) {
    if !reload.is_changed() {
        return;
    }
    for mut background in &mut q_overlay {
        background.0 = Color::srgba(0.0, 0.0, 0.0, reload.coverage());
    }
}

fn log_effects(mut effects: EventReader<MotionEffectEvent>) {
    for event in effects.read() {
        info!("{}: {:?}", event.entity, event.effect);
    }
}

fn log_checkpoints(mut activated: EventReader<CheckpointActivated>) {
    for event in activated.read() {
        info!("checkpoint reached: {}", event.name);
    }
}
