//! Integration tests for the Rapier2D backend.
//!
//! These tests run real Rapier shape-casts against static colliders and
//! check what the ground probe reports.

#![cfg(feature = "rapier2d")]

use bevy::prelude::*;
use bevy::time::Virtual;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;
use platformer_movement::prelude::*;

/// Create a minimal test app with physics and the movement plugin.
fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(PlatformerMovementPlugin::<Rapier2dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(64.0));

    app.finish();
    app.cleanup();
    app
}

/// Spawn a static collider.
fn spawn_block(app: &mut App, position: Vec2, half_size: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(half_size.x, half_size.y),
        ))
        .id()
}

/// Spawn a character that stays where it is put.
///
/// The body is fixed so the probe sees exactly the configured gap.
fn spawn_character(app: &mut App, position: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            PlatformerCharacter,
            PlatformerBodyBundle::new().with_body(RigidBody::Fixed),
            Collider::cuboid(0.5, 0.5),
        ))
        .id()
}

/// Run one physics step.
fn tick(app: &mut App) {
    let timestep = std::time::Duration::from_secs_f64(1.0 / 64.0);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .advance_by(timestep);
    app.update();
    app.world_mut().run_schedule(FixedUpdate);
    app.update();
}

/// Run the app for N physics frames.
fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

fn hits(app: &App, entity: Entity) -> ProbeHits {
    *app.world()
        .get::<ProbeHits>(entity)
        .expect("character should be active")
}

#[test]
fn character_resting_on_ground_is_grounded() {
    let mut app = create_test_app();

    // Ground surface at y=5
    spawn_block(&mut app, Vec2::ZERO, Vec2::new(20.0, 5.0));
    // Collider bottom 0.002 above the surface, inside the probe tolerance
    let character = spawn_character(&mut app, Vec2::new(0.0, 5.502));

    run_frames(&mut app, 2);

    assert!(hits(&app, character).ground);
    assert!(app.world().get::<MovementState>(character).unwrap().is_grounded());
    assert!(app.world().get::<Grounded>(character).is_some());
}

#[test]
fn character_above_ground_is_airborne() {
    let mut app = create_test_app();

    spawn_block(&mut app, Vec2::ZERO, Vec2::new(20.0, 5.0));
    let character = spawn_character(&mut app, Vec2::new(0.0, 8.0));

    run_frames(&mut app, 2);

    assert!(!hits(&app, character).ground);
    assert!(app.world().get::<Airborne>(character).is_some());
}

#[test]
fn ground_mask_filters_out_other_groups() {
    let mut app = create_test_app();

    let ground = spawn_block(&mut app, Vec2::ZERO, Vec2::new(20.0, 5.0));
    app.world_mut()
        .entity_mut(ground)
        .insert(CollisionGroups::new(Group::GROUP_2, Group::ALL));
    let character = spawn_character(&mut app, Vec2::new(0.0, 5.502));
    app.world_mut()
        .entity_mut(character)
        .insert(GroundMask(Group::GROUP_1.bits()));

    run_frames(&mut app, 2);

    assert!(!hits(&app, character).ground);
}

#[test]
fn ceiling_right_above_is_a_head_hit() {
    let mut app = create_test_app();

    // Ceiling underside at y=10.502, character top at y=10.5
    spawn_block(&mut app, Vec2::new(0.0, 11.002), Vec2::new(20.0, 0.5));
    let character = spawn_character(&mut app, Vec2::new(0.0, 10.0));

    run_frames(&mut app, 2);

    let hits = hits(&app, character);
    assert!(hits.head);
    assert!(!hits.ground);
}

#[test]
fn character_without_collider_is_not_activated() {
    let mut app = create_test_app();

    let character = app
        .world_mut()
        .spawn((
            Transform::default(),
            PlatformerCharacter,
            PlatformerBodyBundle::new(),
        ))
        .id();

    run_frames(&mut app, 2);

    assert_eq!(
        app.world().get::<ActivationFailed>(character),
        Some(&ActivationFailed(SetupError::MissingCollider(character)))
    );
}
