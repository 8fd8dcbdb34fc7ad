//! Platformer Example
//!
//! A playable box level with a floor, walls, a low ceiling and a few ledges.
//!
//! ## Controls
//! - **A/D** or **Left/Right**: Move horizontally
//! - **Space**, **W** or **Up**: Jump (release early for a short hop)
//! - **R**: Respawn
//! - **Tab**: Toggle the tuning panel
//!
//! The camera follows the player. Jumps and walking changes are logged.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};
use bevy_rapier2d::prelude::*;
use platformer_movement::prelude::*;

// ==================== Constants ====================

// The world is simulated in meters; the camera zooms in to this many pixels per meter.
const PX_PER_M: f32 = 32.0;

const PLAYER_HALF_SIZE: Vec2 = Vec2::new(0.35, 0.5);

const BOX_WIDTH: f32 = 36.0;
const BOX_HEIGHT: f32 = 20.0;
const WALL_THICKNESS: f32 = 0.6;

const FALL_LIMIT: f32 = -BOX_HEIGHT;

fn spawn_position() -> Vec2 {
    Vec2::new(-12.0, -BOX_HEIGHT / 2.0 + 2.0)
}

/// Marker component for the player entity.
#[derive(Component)]
struct Player;

/// Whether the tuning panel is visible.
#[derive(Resource)]
struct PanelVisible(bool);

// ==================== Main ====================

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Platformer - Movement Example".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        // Physics, stepped on the same fixed clock as the movement pipeline
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
        .add_plugins(RapierDebugRenderPlugin::default())
        .add_plugins(PlatformerMovementPlugin::<Rapier2dBackend>::default())
        .add_plugins(EguiPlugin::default())
        .insert_resource(Time::<Fixed>::from_hz(64.0))
        .insert_resource(PanelVisible(true))
        .add_observer(log_jumps)
        .add_observer(log_walking)
        .add_systems(Startup, setup)
        .add_systems(Update, (camera_follow, respawn_player, toggle_panel))
        .add_systems(EguiPrimaryContextPass, tuning_panel_ui)
        .run();
}

// ==================== Setup ====================

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: 1.0 / PX_PER_M,
            ..OrthographicProjection::default_2d()
        }),
    ));

    spawn_level(&mut commands);
    spawn_player(&mut commands);

    commands.spawn((
        Text::new("A/D: Move | Space: Jump | R: Respawn | Tab: Panel"),
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

fn spawn_level(commands: &mut Commands) {
    let half_width = BOX_WIDTH / 2.0;
    let half_height = BOX_HEIGHT / 2.0;
    let half_wall = WALL_THICKNESS / 2.0;
    let wall_color = Color::srgb(0.3, 0.3, 0.3);
    let ledge_color = Color::srgb(0.4, 0.5, 0.3);

    // Floor, ceiling and walls
    spawn_block(
        commands,
        Vec2::new(0.0, -half_height - half_wall),
        Vec2::new(half_width, half_wall),
        wall_color,
    );
    spawn_block(
        commands,
        Vec2::new(0.0, half_height + half_wall),
        Vec2::new(half_width, half_wall),
        wall_color,
    );
    spawn_block(
        commands,
        Vec2::new(-half_width - half_wall, 0.0),
        Vec2::new(half_wall, half_height),
        wall_color,
    );
    spawn_block(
        commands,
        Vec2::new(half_width + half_wall, 0.0),
        Vec2::new(half_wall, half_height),
        wall_color,
    );

    // Staircase of ledges, the last one under a low ceiling for head nudges
    for (i, x) in [-6.0, 0.0, 6.0, 12.0].into_iter().enumerate() {
        let y = -half_height + 2.5 + 2.5 * i as f32;
        spawn_block(commands, Vec2::new(x, y), Vec2::new(2.0, 0.25), ledge_color);
    }
    spawn_block(
        commands,
        Vec2::new(12.6, -half_height + 13.0),
        Vec2::new(0.8, 0.25),
        ledge_color,
    );
}

fn spawn_block(commands: &mut Commands, position: Vec2, half_size: Vec2, color: Color) {
    commands.spawn((
        Sprite::from_color(color, half_size * 2.0),
        Transform::from_translation(position.extend(0.0)),
        RigidBody::Fixed,
        Collider::cuboid(half_size.x, half_size.y),
    ));
}

fn spawn_player(commands: &mut Commands) {
    commands.spawn((
        Player,
        Name::new("Player"),
        Sprite::from_color(Color::srgb(0.9, 0.6, 0.2), PLAYER_HALF_SIZE * 2.0),
        Transform::from_translation(spawn_position().extend(1.0)),
        PlatformerCharacter,
        TuningPreset::Snappy.profile(),
        InputBindings::default(),
        PlatformerBodyBundle::new(),
        Collider::cuboid(PLAYER_HALF_SIZE.x, PLAYER_HALF_SIZE.y),
    ));
}

// ==================== Signals ====================

fn log_jumps(trigger: Trigger<Jumped>, names: Query<&Name>) {
    let entity = trigger.target();
    match names.get(entity) {
        Ok(name) => info!("{name} jumped"),
        Err(_) => info!("{entity} jumped"),
    }
}

fn log_walking(trigger: Trigger<WalkingChanged>) {
    let verb = if trigger.event().active {
        "started"
    } else {
        "stopped"
    };
    info!("{} {verb} walking", trigger.target());
}

// ==================== Systems ====================

/// Smoothly follows the player with the camera.
fn camera_follow(
    player_query: Query<&Transform, (With<Player>, Without<Camera2d>)>,
    mut camera_query: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(player_transform) = player_query.single() else {
        return;
    };
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let target = player_transform.translation.xy();
    let current = camera_transform.translation.xy();
    let smoothed = current.lerp(target, 0.1);
    camera_transform.translation.x = smoothed.x;
    camera_transform.translation.y = smoothed.y;
}

/// Respawn on R, or after falling out of the level.
fn respawn_player(
    keyboard: Res<ButtonInput<KeyCode>>,
    player_query: Query<(Entity, &Transform), With<Player>>,
    mut respawns: EventWriter<RespawnCharacter>,
) {
    let Ok((entity, transform)) = player_query.single() else {
        return;
    };

    if keyboard.just_pressed(KeyCode::KeyR) || transform.translation.y < FALL_LIMIT {
        respawns.write(RespawnCharacter::at(entity, spawn_position()));
    }
}

fn toggle_panel(keyboard: Res<ButtonInput<KeyCode>>, mut visible: ResMut<PanelVisible>) {
    if keyboard.just_pressed(KeyCode::Tab) {
        visible.0 = !visible.0;
    }
}

/// Preset switcher and live movement state.
fn tuning_panel_ui(
    mut contexts: EguiContexts,
    visible: Res<PanelVisible>,
    player_query: Query<
        (
            Entity,
            &TuningProfile,
            Option<&MovementState>,
            Option<&Facing>,
            Option<&ActivationFailed>,
        ),
        With<Player>,
    >,
    mut selections: EventWriter<SelectPreset>,
) {
    if !visible.0 {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let Ok((entity, profile, state, facing, failed)) = player_query.single() else {
        return;
    };

    egui::Window::new("Movement")
        .default_pos([10.0, 80.0])
        .default_width(260.0)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading("Preset");
            ui.horizontal(|ui| {
                for preset in TuningPreset::ALL {
                    let selected = *profile == preset.profile();
                    if ui.selectable_label(selected, preset.tag()).clicked() && !selected {
                        selections.write(SelectPreset {
                            entity,
                            preset,
                        });
                    }
                }
            });

            ui.separator();

            if let Some(ActivationFailed(err)) = failed {
                ui.colored_label(egui::Color32::from_rgb(230, 80, 80), err.to_string());
                return;
            }
            let Some(state) = state else {
                ui.label("Activating...");
                return;
            };

            ui.heading("State");
            ui.label(format!(
                "Velocity: ({:.1}, {:.1})",
                state.velocity.x, state.velocity.y
            ));
            ui.label(format!("Gravity scale: {:.2}", state.gravity_scale));
            ui.label(format!("Grounded: {}", state.is_grounded()));
            ui.label(format!("Jump queued: {}", state.is_jump_queued()));
            ui.label(format!("Jump cut: {}", state.is_jump_canceled()));
            ui.label(format!("Move axis: {:.2}", state.move_axis()));
            ui.label(format!("Locomotion: {:?}", state.locomotion(0.1)));
            if let Some(facing) = facing {
                ui.label(format!("Facing: {facing:?}"));
            }
        });
}
