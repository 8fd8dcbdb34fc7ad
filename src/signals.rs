//! Signal emitter stage.
//!
//! Movement signals are entity-targeted triggers fired inside the tick that
//! caused them. Observe them per character:
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use platformer_movement::prelude::*;
//!
//! fn spawn(mut commands: Commands) {
//!     commands
//!         .spawn(PlatformerCharacter)
//!         .observe(|trigger: Trigger<Jumped>| {
//!             info!("{} jumped", trigger.target());
//!         });
//! }
//! ```
//!
//! or globally with [`App::add_observer`].

use bevy::prelude::*;

use crate::state::MovementState;

/// A jump launched. Fires exactly once per launch.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Jumped;

/// Horizontal intent switched between zero and non-zero.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkingChanged {
    /// `true` when non-zero intent started, `false` when it returned to zero.
    pub active: bool,
}

/// Signals produced by one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSignals {
    /// A jump launched this tick.
    pub jumped: bool,
    /// Walking changed this tick, with its new value.
    pub walking_changed: Option<bool>,
}

impl TickSignals {
    /// Whether anything needs to be emitted.
    pub fn is_empty(&self) -> bool {
        !self.jumped && self.walking_changed.is_none()
    }
}

/// Collect and clear the signal latches of a state.
///
/// Walking is edge-triggered on the axis being exactly zero or not, so a
/// sustained input produces a single signal.
pub fn take_signals(state: &mut MovementState) -> TickSignals {
    let jumped = std::mem::take(&mut state.jumped_this_tick);

    let active = state.move_axis != 0.0;
    let walking_changed = (active != state.walking).then(|| {
        state.walking = active;
        active
    });

    TickSignals {
        jumped,
        walking_changed,
    }
}
