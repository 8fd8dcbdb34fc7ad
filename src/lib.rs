//! # `platformer_movement`
//!
//! Tight-feeling 2D platformer movement for Bevy, with a physics backend
//! abstraction.
//!
//! This crate turns player intent into velocity changes on a physics body:
//! - Horizontal movement that accelerates toward a target speed, with separate
//!   ground and air rates, damped air control and ground friction
//! - Jumps with input buffering and coyote time, resolved as one condition
//! - Three-phase gravity (normal, falling, jump cut) with a terminal fall speed
//! - A sideways nudge off ceiling corners
//! - `Jumped` and `WalkingChanged` signals for animation and audio
//!
//! ## Architecture
//!
//! Every fixed tick runs the same ordered pipeline ([`MovementSet`]):
//! 1. Newly spawned characters are validated and activated
//! 2. Queued input events are drained into [`MovementState`](state::MovementState)
//! 3. The backend shape-casts above and below each character
//! 4. The ground probe updates contact and coyote state
//! 5. The jump resolver launches buffered presses
//! 6. The gravity shaper picks a gravity scale and clamps the fall speed
//! 7. The horizontal mover steers velocity toward the intent
//! 8. Signals fire and marker components are synced
//!
//! The physics engine integrates the result; the pipeline never moves bodies
//! itself.
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use platformer_movement::prelude::*;
//!
//! // Tuning for a character, starting from a preset
//! let tuning = TuningPreset::Snappy.profile().with_max_speed(12.0);
//! let bindings = InputBindings::default();
//!
//! // Spawn these with `PlatformerCharacter` and the physics components
//! assert!(tuning.validate().is_ok());
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod config;
pub mod error;
pub mod gravity;
pub mod intent;
pub mod jump;
pub mod probe;
pub mod signals;
pub mod state;
pub mod systems;
pub mod walking;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::MovementPhysicsBackend;
    pub use crate::config::{GroundMask, PlatformerCharacter, TuningPreset, TuningProfile};
    pub use crate::error::{ConfigError, SetupError};
    pub use crate::intent::{
        InputAction, InputBindings, MovementInput, RespawnCharacter, SelectPreset,
    };
    pub use crate::signals::{Jumped, WalkingChanged};
    pub use crate::state::{
        ActivationFailed, Airborne, Facing, Grounded, Locomotion, MovementState, ProbeHits,
    };
    pub use crate::{MovementSet, PlatformerMovementPlugin};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{PlatformerBodyBundle, Rapier2dBackend};
}

/// System sets for the movement pipeline.
///
/// Configured to run in order in `FixedUpdate`:
/// `Activation → Input → Sensors → Probe → Jump → Gravity → Horizontal → Signals`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MovementSet {
    /// Validate and activate new characters.
    Activation,
    /// Drain queued input, preset switches and respawns.
    Input,
    /// Backend shape-casts that write `ProbeHits`.
    Sensors,
    /// Ground contact, coyote timestamp and ceiling nudge.
    Probe,
    /// Buffered jump resolution.
    Jump,
    /// Gravity phase selection and fall-speed clamp.
    Gravity,
    /// Horizontal acceleration, friction and facing.
    Horizontal,
    /// Signal emission and marker sync.
    Signals,
}

/// Main plugin for platformer movement.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (velocity, impulses, gravity scale, shape-casts).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier2dBackend`)
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_movement::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
///     .add_plugins(PlatformerMovementPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct PlatformerMovementPlugin<B: backend::MovementPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::MovementPhysicsBackend> Default for PlatformerMovementPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::MovementPhysicsBackend> Plugin for PlatformerMovementPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::PlatformerCharacter>();
        app.register_type::<config::TuningProfile>();
        app.register_type::<config::TuningPreset>();
        app.register_type::<config::GroundMask>();
        app.register_type::<intent::InputBindings>();
        app.register_type::<state::MovementState>();
        app.register_type::<state::ProbeHits>();
        app.register_type::<state::Facing>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();

        app.add_event::<intent::MovementInput>();
        app.add_event::<intent::SelectPreset>();
        app.add_event::<intent::RespawnCharacter>();

        app.configure_sets(
            FixedUpdate,
            (
                MovementSet::Activation,
                MovementSet::Input,
                MovementSet::Sensors,
                MovementSet::Probe,
                MovementSet::Jump,
                MovementSet::Gravity,
                MovementSet::Horizontal,
                MovementSet::Signals,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(Update, intent::keyboard_input);

        app.add_systems(
            FixedUpdate,
            (
                systems::activate_characters::<B>.in_set(MovementSet::Activation),
                (
                    systems::apply_preset_selections,
                    systems::handle_respawns::<B>,
                    systems::apply_movement_input::<B>,
                )
                    .chain()
                    .in_set(MovementSet::Input),
                systems::update_ground_state::<B>.in_set(MovementSet::Probe),
                systems::resolve_jumps::<B>.in_set(MovementSet::Jump),
                systems::shape_gravity::<B>.in_set(MovementSet::Gravity),
                systems::apply_horizontal_movement::<B>.in_set(MovementSet::Horizontal),
                (systems::emit_movement_signals, systems::sync_state_markers)
                    .chain()
                    .in_set(MovementSet::Signals),
            ),
        );
    }
}
