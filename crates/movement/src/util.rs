//! Movement math shared by every state.
//!
//! Nothing here keeps state of its own. Missing collaborators (no physics
//! body yet, no animation layer) make the affected helper a no-op.

use glam::{Quat, Vec2, Vec3};

use crate::config::{GroundParams, MovementParams, SpeedParams};
use crate::host::{AnimationController, Controller, FallDamage, ItemStatus, PlayerEntity, Stance};
use crate::physics::{ActorPhysics, PhysicsFlags, PhysicsParams, UP};
use crate::request::{FrameMovementParams, MovementRequest};
use crate::stats::MovementStats;
use crate::water::WaterProxy;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ============================================================================
// Ground and jump velocity
// ============================================================================

/// Conditions feeding [`adjust_movement_for_environment`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveEnvironment {
    pub heavy_weapon: bool,
    pub carrying_objective: bool,
    pub stance: Stance,
    pub sprinting: bool,
}

impl MoveEnvironment {
    pub fn from_entity(entity: &dyn PlayerEntity, stats: &MovementStats) -> Self {
        Self {
            heavy_weapon: entity.current_item().is_some_and(|item| item.heavy),
            carrying_objective: entity.carrying_objective(),
            stance: stats.stance,
            sprinting: stats.is_sprinting,
        }
    }
}

/// Speed scale from the environment.
///
/// Factors compose in a fixed order: heavy weapon, objective carry,
/// crouch/sprint/walk, then the global scale.
pub fn adjust_movement_for_environment(params: &SpeedParams, env: &MoveEnvironment) -> f32 {
    let mut scale = 1.0;

    if env.heavy_weapon {
        scale *= params.heavy_weapon_multiplier;
    }
    if env.carrying_objective {
        scale *= params.objective_carry_multiplier;
    }

    scale *= if env.stance == Stance::Crouch {
        params.crouch_multiplier
    } else if env.sprinting && env.heavy_weapon {
        params.heavy_sprint_multiplier
    } else if env.sprinting {
        params.sprint_multiplier
    } else {
        params.walk_multiplier
    };

    scale * params.global_multiplier
}

/// World-space velocity for ground or airborne input.
///
/// `basis` is the entity rotation before this tick's turning, so the
/// velocity lags the turn by one tick.
pub fn calculate_ground_or_jump_movement(
    params: &SpeedParams,
    basis: Quat,
    movement: &FrameMovementParams,
    env: &MoveEnvironment,
) -> Vec3 {
    let mut input = Vec2::new(movement.desired_velocity.x, movement.desired_velocity.y);

    // AI supplies an explicit sprint value and may exceed the unit range.
    if movement.sprint <= 0.0 {
        input = input.clamp_length_max(1.0);
    }

    let backward = lerp(1.0, params.backward_multiplier, (-input.y).clamp(0.0, 1.0));
    input.y *= backward;

    let strafe = if env.heavy_weapon {
        params.strafe_multiplier_heavy
    } else {
        params.strafe_multiplier
    };
    input.x *= strafe;

    let mut world = basis * Vec3::new(input.x, input.y, 0.0);
    world.z = 0.0;

    world * params.max_speed(env.stance) * adjust_movement_for_environment(params, env)
}

/// Speed multiplier for wading through water of the given depth.
pub fn shallow_water_multiplier(params: &GroundParams, depth: f32) -> f32 {
    let low = params.shallow_water_depth_low;
    let high = params.shallow_water_depth_high;
    if depth <= low {
        1.0
    } else if depth >= high {
        params.shallow_water_multiplier
    } else {
        lerp(1.0, params.shallow_water_multiplier, (depth - low) / (high - low))
    }
}

/// Damp uphill movement and keep the velocity on the ground plane.
///
/// Players use an angle-remapped normal; AI uses the raw normal scaled by
/// how far its z leans from vertical.
pub fn adjust_for_slope(
    params: &GroundParams,
    velocity: Vec3,
    normal: Vec3,
    controller: Controller,
) -> Vec3 {
    let normal = normal.try_normalize().unwrap_or(UP);

    if controller == Controller::Ai {
        // Repulsion goes on after the projection so it survives it.
        let alignment = normal.dot(velocity).min(0.0);
        let projected = velocity - normal * normal.dot(velocity);
        return projected - normal * alignment * (1.0 - normal.z * normal.z);
    }

    let slope_angle = normal.z.clamp(-1.0, 1.0).acos().to_degrees();
    let start = params.slope_start_angle;
    let end = params.slope_end_angle;
    let fraction = ((slope_angle - start) / (end - start)).clamp(0.0, 1.0);
    let mod_angle = (fraction * fraction * fraction * 90.0).to_radians();

    let horizontal = Vec3::new(normal.x, normal.y, 0.0).normalize_or_zero();
    let modified = horizontal * mod_angle.sin() + UP * mod_angle.cos();
    let alignment = modified.dot(velocity).min(0.0);
    let velocity = velocity - modified * alignment;

    velocity - normal * normal.dot(velocity)
}

// ============================================================================
// Jump and sprint eligibility
// ============================================================================

/// Jump requested, not already jumping, and grounded long enough.
///
/// Remote actors skip the dwell check; the authority already validated it.
pub fn should_jump(
    params: &MovementParams,
    stats: &MovementStats,
    controller: Controller,
    movement: &FrameMovementParams,
) -> bool {
    if !movement.jump || stats.is_jumping {
        return false;
    }
    controller.is_remote() || stats.on_ground_time >= params.jump.min_ground_dwell
}

/// Whether the input points forward.
///
/// Local players test the input angle directly; remote and AI actors use
/// how long forward input has been held, which survives network jitter.
pub fn is_moving_forward(
    params: &MovementParams,
    stats: &MovementStats,
    controller: Controller,
    movement: &FrameMovementParams,
) -> bool {
    match controller {
        Controller::Local => {
            if !movement.has_movement_input() {
                return false;
            }
            let input = Vec2::new(movement.desired_velocity.x, movement.desired_velocity.y);
            input.y / input.length() >= params.sprint.forward_angle.to_radians().cos()
        }
        Controller::Remote | Controller::Ai => {
            stats.forward_move_time >= params.sprint.remote_forward_time
        }
    }
}

/// Whether a sprint request is honoured this tick.
pub fn should_sprint(
    params: &MovementParams,
    stats: &MovementStats,
    controller: Controller,
    item: Option<ItemStatus>,
    movement: &FrameMovementParams,
) -> bool {
    let restricted = stats.is_jumping
        || stats.is_sliding
        || stats.cinematic_restricted
        || stats.sprint_stamina <= 0.0
        || stats.stance != Stance::Stand;
    if restricted {
        return false;
    }
    if item.is_some_and(|item| item.vetoes_sprint()) {
        return false;
    }
    movement.wants_sprint() && is_moving_forward(params, stats, controller, movement)
}

// ============================================================================
// Fall damage
// ============================================================================

/// Damage fraction for an impact speed: 0 below safe, 1 at or above fatal,
/// linear in between.
pub fn fall_damage_fraction(params: &MovementParams, impact_speed: f32) -> f32 {
    let safe = params.fall_damage.safe_speed;
    let fatal = params.fall_damage.fatal_speed;
    if impact_speed < safe {
        0.0
    } else if impact_speed >= fatal {
        1.0
    } else {
        (impact_speed - safe) / (fatal - safe)
    }
}

/// Health lost to an impact.
///
/// Fatal impacts remove max health. Anything else removes a curved fraction
/// of the health above the floor.
pub fn compute_fall_damage(params: &MovementParams, impact_speed: f32, health: f32, max_health: f32) -> f32 {
    let fraction = fall_damage_fraction(params, impact_speed);
    if fraction >= 1.0 {
        max_health
    } else if fraction <= 0.0 {
        0.0
    } else {
        let above_floor = (health - params.fall_damage.health_floor).max(0.0);
        fraction.powf(params.fall_damage.curve_exponent) * above_floor
    }
}

/// Apply landing damage to the entity.
///
/// The impact speed comes from the previous frame's unconstrained velocity:
/// the landing frame has already been clipped by the solver. Landings
/// shortly after swimming are free since water surfaces can report false
/// impacts.
pub fn apply_fall_damage(
    params: &MovementParams,
    entity: &mut dyn PlayerEntity,
    physics: &ActorPhysics,
    water: &WaterProxy,
    start_height: f32,
    current_height: f32,
) -> Option<FallDamage> {
    if water.time_since_swimming <= params.fall_damage.water_exemption_time {
        return None;
    }

    let impact_speed = (-physics.velocity_unconstrained_last.z).max(0.0);
    let amount = compute_fall_damage(params, impact_speed, entity.health(), entity.max_health());
    if amount <= 0.0 {
        return None;
    }

    let damage = FallDamage {
        amount,
        impact_speed,
        fall_height: start_height - current_height,
        fatal: impact_speed >= params.fall_damage.fatal_speed,
    };
    log::debug!(
        "entity {} fall damage {:.1} (impact {:.2} m/s, height {:.2} m)",
        entity.id(),
        damage.amount,
        damage.impact_speed,
        damage.fall_height
    );
    entity.apply_damage(&damage);
    Some(damage)
}

// ============================================================================
// Physics sync
// ============================================================================

/// Refresh the physics snapshot from the living status.
///
/// Runs at most once per `frame_id`; returns whether the snapshot changed.
/// Notifies the entity when the collider it stands on changes.
pub fn update_player_physics_stats(
    physics: &mut ActorPhysics,
    entity: &mut dyn PlayerEntity,
    frame_id: u64,
) -> bool {
    if physics.last_frame_update == Some(frame_id) {
        return false;
    }
    let Some(status) = entity.living_status() else {
        return false;
    };
    physics.last_frame_update = Some(frame_id);

    let was_flying = physics.flags.flying();
    let previous_collider = physics.ground_collider;

    physics.velocity = status.velocity;
    physics.velocity_unconstrained_last = physics.velocity_unconstrained;
    physics.velocity_unconstrained = status.velocity_unconstrained;
    physics.ground_normal = status.ground_normal;
    physics.ground_material = status.ground_material;
    physics.ground_collider = status.ground_collider;
    physics.gravity = status.gravity;
    physics.mass = status.mass;
    physics.angular_velocity = status.angular_velocity;
    physics.flags.set(PhysicsFlags::WAS_FLYING, was_flying);
    physics.flags.set(PhysicsFlags::FLYING, status.flying);
    physics.flags.set(PhysicsFlags::STUCK, status.stuck);

    if previous_collider != status.ground_collider {
        log::trace!(
            "entity {} stood-on changed {:?} -> {:?}",
            entity.id(),
            previous_collider,
            status.ground_collider
        );
        entity.notify_stood_on_change(previous_collider, status.ground_collider);
    }
    true
}

/// Physics parameters for walking under gravity.
pub fn walking_physics(params: &MovementParams) -> PhysicsParams {
    PhysicsParams {
        gravity: Vec3::new(0.0, 0.0, -params.body.gravity),
        air_control: params.jump.air_control,
        inertia: params.body.inertia,
        inertia_accel: params.body.inertia_accel,
        swimming: false,
    }
}

/// Disable gravity on the living body (swimming, ladders, ledges, flight).
pub fn phy_set_fly(params: &MovementParams, entity: &mut dyn PlayerEntity, swimming: bool) {
    let physics = PhysicsParams {
        gravity: Vec3::ZERO,
        air_control: 1.0,
        swimming,
        ..walking_physics(params)
    };
    entity.set_physics_params(&physics);
}

/// Restore gravity and ground inertia.
pub fn phy_set_no_fly(params: &MovementParams, entity: &mut dyn PlayerEntity) {
    entity.set_physics_params(&walking_physics(params));
}

// ============================================================================
// Request
// ============================================================================

/// Fill the rotation and pass-through flags of a request from the input.
pub fn process_turning(request: &mut MovementRequest, movement: &FrameMovementParams) {
    request.rotation = Quat::from_rotation_z(movement.delta_angles.z);
    request.allow_strafe = movement.allow_strafe;
    request.prediction = movement.prediction;
}

/// Commit a request to the locomotion layer and reset it to neutral.
///
/// Returns whether a locomotion layer received it.
pub fn finalize_movement_request(
    animation: Option<&mut dyn AnimationController>,
    request: &mut MovementRequest,
) -> bool {
    let committed = match animation {
        Some(animation) => {
            animation.add_movement(request);
            true
        }
        None => false,
    };
    *request = MovementRequest::neutral();
    committed
}
