//! Character configuration components.
//!
//! This module defines the tuning profile that drives every stage of the
//! movement pipeline, the closed set of named presets, and the marker that
//! opts an entity into the controller.

use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Marker that opts an entity into the platformer movement pipeline.
///
/// The entity is validated once, on the first fixed tick after spawn. If the
/// physics backend finds everything it needs, a fresh
/// [`MovementState`](crate::state::MovementState) is inserted and the
/// pipeline starts driving the body. Otherwise the entity receives
/// [`ActivationFailed`](crate::state::ActivationFailed) and is left alone.
///
/// A [`TuningProfile`] is required; when none is given the `Snappy` preset is
/// used.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
#[require(TuningProfile)]
pub struct PlatformerCharacter;

/// Tuning parameters for the movement pipeline.
///
/// Values are in world units and seconds. Profiles are immutable during a tick;
/// replace the whole component (or send
/// [`SelectPreset`](crate::intent::SelectPreset)) to change them.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct TuningProfile {
    // === Gravity ===
    /// Gravity scale while rising or resting.
    pub gravity_normal: f32,

    /// Gravity scale while falling (`velocity.y < 0`).
    pub gravity_fall: f32,

    /// Gravity scale while rising after an early jump release.
    pub gravity_jump_cut: f32,

    /// Terminal fall speed. Negative; vertical velocity never goes below it.
    pub max_fall_speed: f32,

    // === Jump ===
    /// Upward impulse applied on launch.
    pub jump_force: f32,

    /// Seconds after leaving the ground during which a jump still launches.
    pub coyote_time: f32,

    /// Seconds a jump press stays pending before it is discarded.
    pub jump_buffer_window: f32,

    // === Horizontal ===
    /// Top horizontal speed on the ground.
    pub max_speed: f32,

    /// Rate (units/s²) at which grounded velocity approaches its target.
    pub ground_acceleration: f32,

    /// Rate (units/s²) at which airborne velocity approaches its target.
    pub air_acceleration: f32,

    /// Scales horizontal input while airborne (0.0-1.0).
    pub air_control_multiplier: f32,

    /// Scales top speed while airborne (0.0-1.0).
    pub air_max_speed_multiplier: f32,

    /// Extra deceleration (units/s²) on the ground with no input.
    pub ground_friction: f32,

    /// Axis magnitude at or below which input counts as "none".
    pub input_deadzone: f32,

    // === Probe ===
    /// Distance past the collider bounds within which ground counts as contact.
    pub probe_tolerance: f32,

    /// Horizontal impulse that slides the character off a ceiling corner.
    pub nudge_amount: f32,
}

impl Default for TuningProfile {
    fn default() -> Self {
        TuningPreset::Snappy.profile()
    }
}

impl TuningProfile {
    /// The `Snappy` preset.
    pub fn snappy() -> Self {
        TuningPreset::Snappy.profile()
    }

    /// The `Relaxed` preset.
    pub fn relaxed() -> Self {
        TuningPreset::Relaxed.profile()
    }

    /// Rescale every length-bearing field for a world measured in
    /// `units_per_meter` units (e.g. pixels).
    ///
    /// Times, gravity scales and multipliers are unitless and stay untouched.
    pub fn scaled(mut self, units_per_meter: f32) -> Self {
        self.max_fall_speed *= units_per_meter;
        self.jump_force *= units_per_meter;
        self.max_speed *= units_per_meter;
        self.ground_acceleration *= units_per_meter;
        self.air_acceleration *= units_per_meter;
        self.ground_friction *= units_per_meter;
        self.probe_tolerance *= units_per_meter;
        self.nudge_amount *= units_per_meter;
        self
    }

    /// Top horizontal speed for the given contact state.
    #[inline]
    pub fn top_speed(&self, grounded: bool) -> f32 {
        if grounded {
            self.max_speed
        } else {
            self.max_speed * self.air_max_speed_multiplier
        }
    }

    /// Check that every field is usable by the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(
            field: &'static str,
            value: f32,
            requirement: &'static str,
            ok: bool,
        ) -> Result<(), ConfigError> {
            if ok && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::OutOfRange {
                    field,
                    requirement,
                    value,
                })
            }
        }

        let non_negative =
            |field, value: f32| check(field, value, "zero or positive", value >= 0.0);
        let unit_range =
            |field, value: f32| check(field, value, "within [0, 1]", (0.0..=1.0).contains(&value));

        non_negative("gravity_normal", self.gravity_normal)?;
        non_negative("gravity_fall", self.gravity_fall)?;
        non_negative("gravity_jump_cut", self.gravity_jump_cut)?;
        check(
            "max_fall_speed",
            self.max_fall_speed,
            "negative",
            self.max_fall_speed < 0.0,
        )?;
        non_negative("jump_force", self.jump_force)?;
        non_negative("coyote_time", self.coyote_time)?;
        non_negative("jump_buffer_window", self.jump_buffer_window)?;
        check("max_speed", self.max_speed, "positive", self.max_speed > 0.0)?;
        non_negative("ground_acceleration", self.ground_acceleration)?;
        non_negative("air_acceleration", self.air_acceleration)?;
        unit_range("air_control_multiplier", self.air_control_multiplier)?;
        unit_range("air_max_speed_multiplier", self.air_max_speed_multiplier)?;
        non_negative("ground_friction", self.ground_friction)?;
        check(
            "input_deadzone",
            self.input_deadzone,
            "within [0, 1)",
            (0.0..1.0).contains(&self.input_deadzone),
        )?;
        non_negative("probe_tolerance", self.probe_tolerance)?;
        non_negative("nudge_amount", self.nudge_amount)?;
        Ok(())
    }

    /// Builder: set the three gravity scales.
    pub fn with_gravity_scales(mut self, normal: f32, fall: f32, jump_cut: f32) -> Self {
        self.gravity_normal = normal;
        self.gravity_fall = fall;
        self.gravity_jump_cut = jump_cut;
        self
    }

    /// Builder: set terminal fall speed (negative).
    pub fn with_max_fall_speed(mut self, speed: f32) -> Self {
        self.max_fall_speed = speed;
        self
    }

    /// Builder: set jump impulse.
    pub fn with_jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    /// Builder: set coyote time.
    pub fn with_coyote_time(mut self, time: f32) -> Self {
        self.coyote_time = time;
        self
    }

    /// Builder: set jump buffer window.
    pub fn with_jump_buffer_window(mut self, window: f32) -> Self {
        self.jump_buffer_window = window;
        self
    }

    /// Builder: set top ground speed.
    pub fn with_max_speed(mut self, speed: f32) -> Self {
        self.max_speed = speed;
        self
    }

    /// Builder: set ground and air acceleration.
    pub fn with_acceleration(mut self, ground: f32, air: f32) -> Self {
        self.ground_acceleration = ground;
        self.air_acceleration = air;
        self
    }

    /// Builder: set air control and air top-speed multipliers.
    pub fn with_air_control(mut self, control: f32, max_speed_multiplier: f32) -> Self {
        self.air_control_multiplier = control;
        self.air_max_speed_multiplier = max_speed_multiplier;
        self
    }

    /// Builder: set ground friction.
    pub fn with_ground_friction(mut self, friction: f32) -> Self {
        self.ground_friction = friction;
        self
    }

    /// Builder: set probe tolerance.
    pub fn with_probe_tolerance(mut self, tolerance: f32) -> Self {
        self.probe_tolerance = tolerance;
        self
    }

    /// Builder: set head nudge impulse.
    pub fn with_nudge_amount(mut self, amount: f32) -> Self {
        self.nudge_amount = amount;
        self
    }
}

/// Closed set of named tuning presets.
///
/// Selecting a preset replaces the whole [`TuningProfile`]; presets are never
/// blended.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TuningPreset {
    /// Fast acceleration, heavy fall, short grace windows.
    #[default]
    Snappy,
    /// Floatier arc, gentler acceleration, generous grace windows.
    Relaxed,
}

impl TuningPreset {
    /// Every preset, in declaration order.
    pub const ALL: [TuningPreset; 2] = [TuningPreset::Snappy, TuningPreset::Relaxed];

    /// The fixed parameter table for this preset.
    pub const fn profile(self) -> TuningProfile {
        match self {
            TuningPreset::Snappy => TuningProfile {
                gravity_normal: 1.0,
                gravity_fall: 3.5,
                gravity_jump_cut: 5.0,
                max_fall_speed: -25.0,
                jump_force: 15.0,
                coyote_time: 0.08,
                jump_buffer_window: 0.1,
                max_speed: 10.0,
                ground_acceleration: 120.0,
                air_acceleration: 40.0,
                air_control_multiplier: 0.75,
                air_max_speed_multiplier: 0.9,
                ground_friction: 20.0,
                input_deadzone: 0.01,
                probe_tolerance: 0.005,
                nudge_amount: 0.1,
            },
            TuningPreset::Relaxed => TuningProfile {
                gravity_normal: 1.0,
                gravity_fall: 2.0,
                gravity_jump_cut: 3.0,
                max_fall_speed: -18.0,
                jump_force: 12.0,
                coyote_time: 0.15,
                jump_buffer_window: 0.2,
                max_speed: 8.0,
                ground_acceleration: 60.0,
                air_acceleration: 25.0,
                air_control_multiplier: 0.9,
                air_max_speed_multiplier: 1.0,
                ground_friction: 12.0,
                input_deadzone: 0.01,
                probe_tolerance: 0.01,
                nudge_amount: 0.15,
            },
        }
    }

    /// Lowercase tag used by [`FromStr`], [`Display`](fmt::Display) and serde.
    pub const fn tag(self) -> &'static str {
        match self {
            TuningPreset::Snappy => "snappy",
            TuningPreset::Relaxed => "relaxed",
        }
    }
}

impl From<TuningPreset> for TuningProfile {
    fn from(preset: TuningPreset) -> Self {
        preset.profile()
    }
}

impl fmt::Display for TuningPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TuningPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TuningPreset::ALL
            .into_iter()
            .find(|preset| preset.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_owned()))
    }
}

/// Collision-group filter bits the ground probe casts against.
///
/// Only colliders whose membership intersects these bits count as ground or
/// ceiling. Without this component every collider counts.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct GroundMask(pub u32);

impl Default for GroundMask {
    fn default() -> Self {
        Self(u32::MAX)
    }
}
