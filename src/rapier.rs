//! Rapier2D backend.
//!
//! Drives characters through Rapier's velocity, impulse and gravity-scale
//! components, and probes for ground and ceilings with Rapier scene queries.
//! Available with the `rapier2d` feature (on by default).

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::MovementPhysicsBackend;
use crate::config::{GroundMask, TuningProfile};
use crate::error::SetupError;
use crate::state::{MovementState, ProbeHits};
use crate::MovementSet;

/// Probe segments are narrower than the collider so flush walls don't read as ground.
const PROBE_WIDTH_FACTOR: f32 = 0.9;

/// Rapier2D physics backend for platformer movement.
///
/// Velocity and gravity scale map onto Rapier's [`Velocity`] and
/// [`GravityScale`] components, impulses onto [`ExternalImpulse`]. Ground
/// and ceiling probing is handled by a dedicated system that receives the
/// Rapier context as a system parameter.
pub struct Rapier2dBackend;

impl MovementPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn validate(world: &World, entity: Entity) -> Result<(), SetupError> {
        if world.get::<RigidBody>(entity).is_none() || world.get::<Velocity>(entity).is_none() {
            return Err(SetupError::MissingBody(entity));
        }
        if world.get::<Collider>(entity).is_none() {
            return Err(SetupError::MissingCollider(entity));
        }
        Ok(())
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            // Unit mass assumed without an impulse accumulator
            vel.linvel += impulse;
        }
    }

    fn get_gravity_scale(world: &World, entity: Entity) -> f32 {
        world
            .get::<GravityScale>(entity)
            .map(|g| g.0)
            .unwrap_or(1.0)
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut gravity) = world.get_mut::<GravityScale>(entity) {
            if gravity.0 != scale {
                gravity.0 = scale;
            }
        } else if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert(GravityScale(scale));
        }
    }
}

/// Plugin that sets up Rapier2D-specific systems for platformer movement.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            rapier_ground_probe.in_set(MovementSet::Sensors),
        );
    }
}

/// Half-height of a collider: center to bottom edge.
///
/// Capsules count their radius. Unsupported shapes report 0.
pub fn get_collider_bottom_offset(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        // For capsule_y(half_height, radius), the segment endpoints are at y = ±half_height
        let segment = capsule.segment();
        let half_height = (segment.a().y - segment.b().y).abs() / 2.0;
        half_height + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        0.0
    }
}

/// Get the distance from collider center to its side.
pub fn get_collider_half_width(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        (segment.a().x - segment.b().x).abs() / 2.0 + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().x
    } else {
        0.0
    }
}

/// Filter that skips the casting body, sensors and non-ground colliders.
fn probe_filter(exclude_entity: Entity, mask: Option<&GroundMask>) -> QueryFilter<'static> {
    let mut filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors();

    if let Some(mask) = mask {
        filter = filter.groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(mask.0),
        ));
    }

    filter
}

/// Sweep a horizontal segment of `width` from `origin` along `direction`.
fn rapier_segment_cast(
    context: &RapierContext,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    width: f32,
    filter: QueryFilter,
) -> bool {
    let half_width = width / 2.0;
    let shape = Collider::segment(Vec2::new(-half_width, 0.0), Vec2::new(half_width, 0.0));

    context
        .cast_shape(
            origin,
            0.0,
            direction,
            &shape,
            ShapeCastOptions {
                max_time_of_impact: max_distance,
                stop_at_penetration: false,
                ..default()
            },
            filter,
        )
        .is_some()
}

/// Cast a ray from `origin` along `direction`.
fn rapier_raycast(
    context: &RapierContext,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: QueryFilter,
) -> bool {
    context
        .cast_ray(origin, direction, max_distance, true, filter)
        .is_some()
}

/// Rapier-specific ground and ceiling probe.
///
/// The ground probe sweeps a segment almost as wide as the collider down from
/// its center, as far as the collider's bottom plus `probe_tolerance`. The
/// ceiling probe is a single ray up from the center, as far as the top plus
/// `probe_tolerance`, so only hits near the middle of the head count.
pub(crate) fn rapier_ground_probe(
    rapier_context: ReadRapierContext,
    mut q_characters: Query<
        (
            Entity,
            &GlobalTransform,
            &Collider,
            &TuningProfile,
            Option<&GroundMask>,
            &mut ProbeHits,
        ),
        With<MovementState>,
    >,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, collider, profile, mask, mut hits) in &mut q_characters {
        let position = transform.translation().xy();
        let extent = get_collider_bottom_offset(collider);
        let width = 2.0 * get_collider_half_width(collider) * PROBE_WIDTH_FACTOR;
        let filter = probe_filter(entity, mask);

        let ground = rapier_segment_cast(
            &context,
            position,
            Vec2::NEG_Y,
            extent + profile.probe_tolerance,
            width,
            filter,
        );
        let head = rapier_raycast(
            &context,
            position,
            Vec2::Y,
            extent + profile.probe_tolerance,
            filter,
        );

        let next = ProbeHits::new(ground, head);
        if *hits != next {
            *hits = next;
        }
    }
}

/// Bundle for creating a platformer body with Rapier2D physics.
///
/// This bundle provides all the Rapier2D components the movement pipeline
/// drives: the rigid body, velocity, impulses for jumps and nudges, and the
/// gravity scale the gravity shaper writes every tick.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_movement::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         PlatformerCharacter,
///         TuningPreset::Snappy.profile(),
///         InputBindings::default(),
///         PlatformerBodyBundle::new(),
///         Collider::cuboid(0.4, 0.5),
///     ));
/// }
/// ```
///
/// # Defaults
///
/// - `rigid_body`: [`RigidBody::Dynamic`]
/// - `locked_axes`: [`LockedAxes::ROTATION_LOCKED`], the character always stays upright
/// - `gravity_scale`: 1.0, overwritten by the gravity shaper each tick
/// - `damping`: none, the pipeline owns deceleration
/// - `friction`: none, ground friction comes from the tuning profile
/// - `mass`: 1.0, so `jump_force` and `nudge_amount` act as velocity changes
#[derive(Bundle)]
pub struct PlatformerBodyBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`].
    pub rigid_body: RigidBody,
    /// Body velocity, read and written by the pipeline every tick.
    pub velocity: Velocity,
    /// Accumulated impulses for this step. Used for jumps and ceiling nudges.
    pub external_impulse: ExternalImpulse,
    /// Gravity multiplier chosen by the gravity shaper.
    pub gravity_scale: GravityScale,
    /// Which axes are locked.
    pub locked_axes: LockedAxes,
    /// Damping coefficients for velocity reduction.
    pub damping: Damping,
    /// Contact friction of the character's collider.
    pub friction: Friction,
    /// Mass of the character's collider.
    pub mass: ColliderMassProperties,
}

impl Default for PlatformerBodyBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformerBodyBundle {
    /// Create a body bundle with the defaults listed above.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_impulse: ExternalImpulse::default(),
            gravity_scale: GravityScale(1.0),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            mass: ColliderMassProperties::Mass(1.0),
        }
    }

    /// Use a different rigid body type.
    ///
    /// A [`RigidBody::KinematicVelocityBased`] body is still driven through
    /// its velocity, but ignores gravity and impulses.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    ///
    /// Any linear damping stacks on top of the profile's friction and makes
    /// the tuning feel heavier than its numbers suggest.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Lock different axes. Unlocking rotation lets the character tip over.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }

    /// Set the collider mass. Impulses are divided by it.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = ColliderMassProperties::Mass(mass);
        self
    }
}
