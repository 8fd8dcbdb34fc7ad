//! Movement intent.
//!
//! Intent arrives as buffered events between ticks and is drained once at the
//! start of each fixed tick, so nothing inside the pipeline sees a half-applied
//! input. Any source can send them: keyboard, gamepad, AI, replay, network.
//!
//! # Example
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use platformer_movement::prelude::*;
//!
//! fn ai_jump(
//!     mut inputs: EventWriter<MovementInput>,
//!     q: Query<Entity, With<PlatformerCharacter>>,
//! ) {
//!     for entity in &q {
//!         inputs.write(MovementInput::new(entity, InputAction::Move(1.0)));
//!         inputs.write(MovementInput::new(entity, InputAction::JumpPressed));
//!     }
//! }
//! ```

use bevy::prelude::*;

use crate::config::TuningPreset;
use crate::error::SetupError;

/// One intent change for one character.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct MovementInput {
    /// The character the intent is for.
    pub entity: Entity,
    /// What changed.
    pub action: InputAction,
}

impl MovementInput {
    /// Create an input event.
    pub fn new(entity: Entity, action: InputAction) -> Self {
        Self { entity, action }
    }
}

/// The kinds of intent change.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    /// Horizontal axis changed (-1.0 = left, 1.0 = right). Replaces, never accumulates.
    Move(f32),
    /// Horizontal input ended; the axis becomes exactly zero.
    MoveCanceled,
    /// Jump button went down.
    JumpPressed,
    /// Jump button went up.
    JumpReleased,
}

/// Replace a character's tuning with a preset at the next tick boundary.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectPreset {
    /// The character to retune.
    pub entity: Entity,
    /// The preset to apply.
    pub preset: TuningPreset,
}

/// Give a character a brand-new movement state at the next tick boundary.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct RespawnCharacter {
    /// The character to respawn.
    pub entity: Entity,
    /// Where to place the body, if it should move.
    pub position: Option<Vec2>,
}

impl RespawnCharacter {
    /// Respawn in place.
    pub fn in_place(entity: Entity) -> Self {
        Self {
            entity,
            position: None,
        }
    }

    /// Respawn at a position.
    pub fn at(entity: Entity, position: Vec2) -> Self {
        Self {
            entity,
            position: Some(position),
        }
    }
}

/// Keyboard bindings for a player-controlled character.
///
/// The [`keyboard_input`] system turns key edges into [`MovementInput`]
/// events. Every action needs at least one key; an empty list aborts
/// activation.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct InputBindings {
    /// Keys that push left.
    pub left: Vec<KeyCode>,
    /// Keys that push right.
    pub right: Vec<KeyCode>,
    /// Keys that jump.
    pub jump: Vec<KeyCode>,
    /// Last axis sent, so unchanged input is not resent.
    #[reflect(ignore)]
    pub(crate) last_axis: f32,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::new(
            [KeyCode::KeyA, KeyCode::ArrowLeft],
            [KeyCode::KeyD, KeyCode::ArrowRight],
            [KeyCode::Space, KeyCode::KeyW, KeyCode::ArrowUp],
        )
    }
}

impl InputBindings {
    /// Create bindings from key lists.
    pub fn new(
        left: impl IntoIterator<Item = KeyCode>,
        right: impl IntoIterator<Item = KeyCode>,
        jump: impl IntoIterator<Item = KeyCode>,
    ) -> Self {
        Self {
            left: left.into_iter().collect(),
            right: right.into_iter().collect(),
            jump: jump.into_iter().collect(),
            last_axis: 0.0,
        }
    }

    /// Check that every action has a key.
    pub fn validate(&self, entity: Entity) -> Result<(), SetupError> {
        let unbound = [
            ("move left", &self.left),
            ("move right", &self.right),
            ("jump", &self.jump),
        ]
        .into_iter()
        .find(|(_, keys)| keys.is_empty());

        match unbound {
            Some((action, _)) => Err(SetupError::UnboundInput { entity, action }),
            None => Ok(()),
        }
    }

    /// Axis implied by the currently held keys.
    pub fn axis(&self, keyboard: &ButtonInput<KeyCode>) -> f32 {
        let mut axis = 0.0;
        if keyboard.any_pressed(self.left.iter().copied()) {
            axis -= 1.0;
        }
        if keyboard.any_pressed(self.right.iter().copied()) {
            axis += 1.0;
        }
        axis
    }
}

/// Translate keyboard state into movement input events.
///
/// Sends an axis event only when the resolved axis changes, and jump events
/// only on key edges.
pub fn keyboard_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut q_bindings: Query<(Entity, &mut InputBindings)>,
    mut inputs: EventWriter<MovementInput>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    for (entity, mut bindings) in &mut q_bindings {
        let axis = bindings.axis(&keyboard);
        if axis != bindings.last_axis {
            bindings.last_axis = axis;
            let action = if axis == 0.0 {
                InputAction::MoveCanceled
            } else {
                InputAction::Move(axis)
            };
            inputs.write(MovementInput::new(entity, action));
        }

        if keyboard.any_just_pressed(bindings.jump.iter().copied()) {
            inputs.write(MovementInput::new(entity, InputAction::JumpPressed));
        }
        if keyboard.any_just_released(bindings.jump.iter().copied()) {
            inputs.write(MovementInput::new(entity, InputAction::JumpReleased));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_are_complete() {
        let entity = Entity::from_raw(1);
        assert_eq!(InputBindings::default().validate(entity), Ok(()));
    }

    #[test]
    fn empty_jump_binding_is_rejected() {
        let entity = Entity::from_raw(1);
        let bindings = InputBindings::new([KeyCode::KeyA], [KeyCode::KeyD], []);
        assert_eq!(
            bindings.validate(entity),
            Err(SetupError::UnboundInput {
                entity,
                action: "jump"
            })
        );
    }

    #[test]
    fn axis_combines_held_keys() {
        let bindings = InputBindings::default();
        let mut keyboard = ButtonInput::<KeyCode>::default();
        assert_eq!(bindings.axis(&keyboard), 0.0);

        keyboard.press(KeyCode::KeyA);
        assert_eq!(bindings.axis(&keyboard), -1.0);

        keyboard.press(KeyCode::ArrowRight);
        assert_eq!(bindings.axis(&keyboard), 0.0);

        keyboard.release(KeyCode::KeyA);
        assert_eq!(bindings.axis(&keyboard), 1.0);
    }

    #[test]
    fn keyboard_sends_edges_only() {
        let mut app = App::new();
        app.add_event::<MovementInput>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.add_systems(Update, keyboard_input);

        let entity = app.world_mut().spawn(InputBindings::default()).id();

        let drain = |app: &mut App| -> Vec<InputAction> {
            app.world_mut()
                .resource_mut::<Events<MovementInput>>()
                .drain()
                .map(|input| {
                    assert_eq!(input.entity, entity);
                    input.action
                })
                .collect()
        };

        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::KeyD);
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Space);
        app.update();
        assert_eq!(
            drain(&mut app),
            vec![InputAction::Move(1.0), InputAction::JumpPressed]
        );

        // Held keys produce nothing new
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .clear();
        app.update();
        assert!(drain(&mut app).is_empty());

        {
            let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keyboard.release(KeyCode::KeyD);
            keyboard.release(KeyCode::Space);
        }
        app.update();
        assert_eq!(
            drain(&mut app),
            vec![InputAction::MoveCanceled, InputAction::JumpReleased]
        );
    }
}
