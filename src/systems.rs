//! Core movement systems.
//!
//! Each system wraps one stage of the per-tick pipeline. They are generic
//! over the physics backend so the stages only ever see velocities and
//! gravity scales, never engine types. Systems that talk to the backend are
//! exclusive: they collect the characters first, then read the body, run the
//! stage on [`MovementState`] and write the result back.

use bevy::ecs::event::EventCursor;
use bevy::prelude::*;

use crate::backend::MovementPhysicsBackend;
use crate::config::{PlatformerCharacter, TuningProfile};
use crate::error::SetupError;
use crate::gravity;
use crate::intent::{
    InputAction, InputBindings, MovementInput, RespawnCharacter, SelectPreset,
};
use crate::jump::{self, JumpResolution};
use crate::probe;
use crate::signals::{self, Jumped, WalkingChanged};
use crate::state::{ActivationFailed, Airborne, Facing, Grounded, MovementState, ProbeHits};
use crate::walking;

/// Current time on the fixed clock.
///
/// Kept in `f64` so timestamps stay exact multiples of the step at any uptime.
fn fixed_now(world: &World) -> f64 {
    world
        .get_resource::<Time<Fixed>>()
        .map(|t| t.elapsed_secs_f64())
        .unwrap_or(0.0)
}

/// Collect every active character with a copy of its tuning.
fn active_characters(world: &mut World) -> Vec<(Entity, TuningProfile)> {
    world
        .query_filtered::<(Entity, &TuningProfile), With<MovementState>>()
        .iter(world)
        .map(|(e, profile)| (e, *profile))
        .collect()
}

/// Check whether an entity can be driven by backend `B`.
///
/// Runs the same checks as activation: the backend's body and collider
/// requirements, the tuning profile, and the keyboard bindings if present.
pub fn validate_character<B: MovementPhysicsBackend>(
    world: &World,
    entity: Entity,
) -> Result<(), SetupError> {
    B::validate(world, entity)?;

    let profile = world
        .get::<TuningProfile>(entity)
        .copied()
        .unwrap_or_default();
    profile
        .validate()
        .map_err(|source| SetupError::InvalidProfile { entity, source })?;

    if let Some(bindings) = world.get::<InputBindings>(entity) {
        bindings.validate(entity)?;
    }

    Ok(())
}

/// Activate newly spawned characters.
///
/// A character that passes validation gets a fresh [`MovementState`]. One
/// that fails is tagged [`ActivationFailed`] and left alone from then on.
pub fn activate_characters<B: MovementPhysicsBackend>(world: &mut World) {
    let pending: Vec<Entity> = world
        .query_filtered::<Entity, (
            With<PlatformerCharacter>,
            Without<MovementState>,
            Without<ActivationFailed>,
        )>()
        .iter(world)
        .collect();

    for entity in pending {
        match validate_character::<B>(world, entity) {
            Ok(()) => {
                let gravity_normal = world
                    .get::<TuningProfile>(entity)
                    .map(|p| p.gravity_normal)
                    .unwrap_or(1.0);

                world.entity_mut(entity).insert((
                    MovementState::new(),
                    ProbeHits::default(),
                    Airborne,
                ));
                world.entity_mut(entity).insert_if_new(Facing::default());
                B::set_gravity_scale(world, entity, gravity_normal);

                info!("Activated platformer character {entity}");
            }
            Err(err) => {
                error!("Failed to activate platformer character: {err}");
                world.entity_mut(entity).insert(ActivationFailed(err));
            }
        }
    }
}

/// Swap tuning profiles requested through [`SelectPreset`].
///
/// The whole component is replaced, so a tick never mixes two presets.
pub fn apply_preset_selections(
    mut selections: EventReader<SelectPreset>,
    mut q_profiles: Query<&mut TuningProfile, With<PlatformerCharacter>>,
) {
    for selection in selections.read() {
        let Ok(mut profile) = q_profiles.get_mut(selection.entity) else {
            continue;
        };
        *profile = selection.preset.profile();
        debug!(
            "Character {} switched to the {} preset",
            selection.entity, selection.preset
        );
    }
}

/// Give respawned characters a brand-new movement state.
///
/// A character that was walking gets a closing `WalkingChanged` first, so
/// observers never see two starts in a row.
pub fn handle_respawns<B: MovementPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<RespawnCharacter>>,
) {
    let requests: Vec<RespawnCharacter> = {
        let Some(events) = world.get_resource::<Events<RespawnCharacter>>() else {
            return;
        };
        cursor.read(events).copied().collect()
    };

    for request in requests {
        let entity = request.entity;
        let Some(was_walking) = world.get::<MovementState>(entity).map(|s| s.walking) else {
            continue;
        };
        let Some(profile) = world.get::<TuningProfile>(entity) else {
            continue;
        };
        let gravity_normal = profile.gravity_normal;

        if was_walking {
            world.trigger_targets(WalkingChanged { active: false }, entity);
        }

        world
            .entity_mut(entity)
            .insert((MovementState::new(), ProbeHits::default()));

        // Held keys are re-sent against the fresh state
        if let Some(mut bindings) = world.get_mut::<InputBindings>(entity) {
            bindings.last_axis = 0.0;
        }

        if let Some(position) = request.position {
            B::set_position(world, entity, position);
        }
        B::set_velocity(world, entity, Vec2::ZERO);
        B::set_gravity_scale(world, entity, gravity_normal);

        info!("Respawned platformer character {entity}");
    }
}

/// Drain the input queue into the movement states.
///
/// Presses are stamped with the fixed clock of the tick that drains them.
/// Velocity is refreshed from the body first, so a release right after a
/// launch sees the jump impulse.
pub fn apply_movement_input<B: MovementPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<MovementInput>>,
) {
    let now = fixed_now(world);
    let inputs: Vec<MovementInput> = {
        let Some(events) = world.get_resource::<Events<MovementInput>>() else {
            return;
        };
        cursor.read(events).copied().collect()
    };

    for input in inputs {
        let velocity = B::get_velocity(world, input.entity);
        let Some(mut state) = world.get_mut::<MovementState>(input.entity) else {
            continue;
        };
        state.velocity = velocity;

        match input.action {
            InputAction::Move(axis) => state.set_move_axis(axis),
            InputAction::MoveCanceled => state.set_move_axis(0.0),
            InputAction::JumpPressed => state.press_jump(now),
            InputAction::JumpReleased => {
                if state.release_jump() {
                    trace!("Character {} cut its jump short", input.entity);
                }
            }
        }
    }
}

/// Apply the ground probe results.
///
/// Updates the grounded flag and coyote timestamp, and nudges characters off
/// ceiling corners.
pub fn update_ground_state<B: MovementPhysicsBackend>(world: &mut World) {
    let now = fixed_now(world);

    for (entity, profile) in active_characters(world) {
        let velocity = B::get_velocity(world, entity);
        let hits = world.get::<ProbeHits>(entity).copied().unwrap_or_default();

        let outcome = {
            let Some(mut state) = world.get_mut::<MovementState>(entity) else {
                continue;
            };
            state.velocity = velocity;
            probe::apply_ground_probe(&mut state, &profile, hits, now)
        };

        if outcome.landed {
            debug!("Character {entity} landed");
        } else if outcome.took_off {
            debug!("Character {entity} left the ground");
        }

        if let Some(nudge) = outcome.nudge {
            B::apply_impulse(world, entity, nudge);
        }
    }
}

/// Launch pending jumps.
pub fn resolve_jumps<B: MovementPhysicsBackend>(world: &mut World) {
    let now = fixed_now(world);

    for (entity, profile) in active_characters(world) {
        let velocity = B::get_velocity(world, entity);

        let (resolution, velocity, gravity_scale) = {
            let Some(mut state) = world.get_mut::<MovementState>(entity) else {
                continue;
            };
            state.velocity = velocity;
            let resolution = jump::resolve_jump(&mut state, &profile, now);
            (resolution, state.velocity, state.gravity_scale)
        };

        match resolution {
            JumpResolution::Launched { impulse } => {
                B::set_velocity(world, entity, velocity);
                B::set_gravity_scale(world, entity, gravity_scale);
                B::apply_impulse(world, entity, impulse);
                debug!("Character {entity} jumped");
            }
            JumpResolution::Expired => {
                trace!("Character {entity} dropped a buffered jump");
            }
            JumpResolution::Idle | JumpResolution::Pending => {}
        }
    }
}

/// Pick the gravity scale for this tick and clamp the fall speed.
pub fn shape_gravity<B: MovementPhysicsBackend>(world: &mut World) {
    for (entity, profile) in active_characters(world) {
        let velocity = B::get_velocity(world, entity);

        let (velocity, gravity_scale) = {
            let Some(mut state) = world.get_mut::<MovementState>(entity) else {
                continue;
            };
            state.velocity = velocity;
            gravity::shape_gravity(&mut state, &profile);
            (state.velocity, state.gravity_scale)
        };

        B::set_gravity_scale(world, entity, gravity_scale);
        B::set_velocity(world, entity, velocity);
    }
}

/// Steer horizontal velocity toward the intent, and update facing.
pub fn apply_horizontal_movement<B: MovementPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    for (entity, profile) in active_characters(world) {
        let velocity = B::get_velocity(world, entity);

        let (velocity, axis) = {
            let Some(mut state) = world.get_mut::<MovementState>(entity) else {
                continue;
            };
            state.velocity = velocity;
            walking::apply_horizontal(&mut state, &profile, dt);
            (state.velocity, state.move_axis)
        };

        B::set_velocity(world, entity, velocity);

        let facing = {
            let Some(mut facing) = world.get_mut::<Facing>(entity) else {
                continue;
            };
            let next = walking::facing_for(*facing, axis, &profile);
            if *facing != next {
                *facing = next;
            }
            next
        };

        if let Some(mut sprite) = world.get_mut::<Sprite>(entity) {
            if sprite.flip_x != facing.is_left() {
                sprite.flip_x = facing.is_left();
            }
        }
    }
}

/// Fire this tick's movement signals as entity-targeted triggers.
pub fn emit_movement_signals(world: &mut World) {
    let pending: Vec<_> = world
        .query::<(Entity, &mut MovementState)>()
        .iter_mut(world)
        .map(|(e, mut state)| (e, signals::take_signals(&mut state)))
        .filter(|(_, signals)| !signals.is_empty())
        .collect();

    for (entity, signals) in pending {
        if signals.jumped {
            world.trigger_targets(Jumped, entity);
        }
        if let Some(active) = signals.walking_changed {
            world.trigger_targets(WalkingChanged { active }, entity);
        }
    }
}

/// Sync the grounded marker components with the movement state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_states: Query<(Entity, &MovementState, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, state, has_grounded, has_airborne) in &q_states {
        if state.is_grounded() && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !state.is_grounded() && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }
    }
}
