//! Physics backend abstraction.
//!
//! The movement pipeline never integrates motion itself. It reads velocity,
//! writes velocity, applies impulses and picks a gravity scale; the physics
//! engine behind this trait does the rest. This keeps the pipeline testable
//! with a trivial integrator and lets the engine be swapped.

use bevy::prelude::*;

use crate::error::SetupError;

/// Trait for physics backend implementations.
///
/// Implement this trait to drive characters with a physics engine. The
/// backend's [`plugin`](MovementPhysicsBackend::plugin) must install a system
/// in [`MovementSet::Sensors`](crate::MovementSet::Sensors) that writes
/// [`ProbeHits`](crate::state::ProbeHits) for every active character.
///
/// See the `rapier` module's `Rapier2dBackend` for a full implementation.
pub trait MovementPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Check that an entity has everything this backend needs to drive it.
    ///
    /// Called once, on activation. An error keeps the character inactive.
    fn validate(world: &World, entity: Entity) -> Result<(), SetupError>;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply an instantaneous impulse to an entity.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2);

    /// Get the gravity multiplier currently applied to an entity.
    fn get_gravity_scale(world: &World, entity: Entity) -> f32;

    /// Set the gravity multiplier applied to an entity by the integrator.
    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32);

    /// Move an entity, keeping its depth.
    fn set_position(world: &mut World, entity: Entity, position: Vec2) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation.x = position.x;
            transform.translation.y = position.y;
        }
    }

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
///
/// Backends using it must write [`ProbeHits`](crate::state::ProbeHits) some
/// other way, e.g. from test code.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
