//! On-foot locomotion while the player has ground contact.

use glam::Vec3;

use crate::config::VaultCheckMode;
use crate::hsm::{StateId, Transition};
use crate::physics::PhysicsParams;
use crate::request::{FrameMovementParams, RequestKind};
use crate::util::{self, MoveEnvironment};

use super::jump::JumpRequest;
use super::ledge::try_ledge_grab;
use super::{MovementEvent, PendingEntry, Session, StateCtx};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct GroundSession {
    /// Inertia is zeroed while aligning to a melee target.
    pub close_combat: bool,
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    ctx.stats.is_jumping = false;
    *ctx.session = Some(Session::Ground(GroundSession::default()));
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    if let Some(Session::Ground(session)) = &*ctx.session {
        if session.close_combat {
            util::phy_set_no_fly(ctx.params, ctx.host.entity);
        }
    }
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { frame_time, movement } => {
            pre_physics(ctx, frame_time, &movement)
        }
        _ => Transition::Continue,
    }
}

fn close_combat_active(ctx: &StateCtx) -> bool {
    matches!(&*ctx.session, Some(Session::Ground(session)) if session.close_combat)
}

fn set_close_combat(ctx: &mut StateCtx, active: bool) {
    if let Some(Session::Ground(session)) = ctx.session.as_mut() {
        session.close_combat = active;
    }
}

fn pre_physics(ctx: &mut StateCtx, frame_time: f32, movement: &FrameMovementParams) -> Transition {
    let position = ctx.host.entity.world_position();
    let controller = ctx.host.entity.controller();

    let probe_ledges = match ctx.params.ledge.vault_check {
        VaultCheckMode::WhileJumpHeld => movement.jump,
        VaultCheckMode::Always => true,
    };
    if probe_ledges {
        let grab = try_ledge_grab(
            ctx.params,
            ctx.host.entity,
            ctx.host.ledges,
            position.z + ctx.params.jump.height,
            position.z,
            ctx.stats.is_sprinting,
        );
        if let Some(grab) = grab {
            *ctx.pending = Some(PendingEntry::Ledge(grab));
            return Transition::To(StateId::Ledge);
        }
    }

    if util::should_jump(ctx.params, ctx.stats, controller, movement) {
        let request = if ctx.stats.is_sprinting {
            JumpRequest::sprint(ctx.params)
        } else {
            JumpRequest::standard(ctx.params)
        };
        *ctx.pending = Some(PendingEntry::Jump(request));
        return Transition::To(StateId::Jump);
    }

    let velocity = match ctx.host.entity.close_combat_target() {
        Some(target) => {
            if !close_combat_active(ctx) {
                let physics = PhysicsParams {
                    inertia: 0.0,
                    inertia_accel: 0.0,
                    ..util::walking_physics(ctx.params)
                };
                ctx.host.entity.set_physics_params(&physics);
                set_close_combat(ctx, true);
            }
            let mut offset = target - position;
            offset.z = 0.0;
            let speed = if frame_time > 0.0 {
                (offset.length() / frame_time).min(ctx.params.ground.close_combat_max_speed)
            } else {
                0.0
            };
            offset.normalize_or_zero() * speed
        }
        None => {
            if close_combat_active(ctx) {
                util::phy_set_no_fly(ctx.params, ctx.host.entity);
                set_close_combat(ctx, false);
            }
            ground_velocity(ctx, frame_time, movement)
        }
    };

    let request = ctx.frame.write();
    request.kind = RequestKind::Normal;
    request.velocity = velocity;
    util::process_turning(request, movement);
    Transition::Continue
}

fn ground_velocity(ctx: &mut StateCtx, frame_time: f32, movement: &FrameMovementParams) -> Vec3 {
    let env = MoveEnvironment::from_entity(ctx.host.entity, ctx.stats);
    let mut velocity = util::calculate_ground_or_jump_movement(
        &ctx.params.speed,
        ctx.host.entity.base_rotation(),
        movement,
        &env,
    );

    if ctx.water.in_water() {
        velocity *= util::shallow_water_multiplier(&ctx.params.ground, ctx.water.relative_bottom_depth);
    }

    ctx.stats.smooth_ground_normal(
        ctx.physics.ground_normal,
        ctx.params.ground.normal_smoothing,
        frame_time,
    );
    let velocity = util::adjust_for_slope(
        &ctx.params.ground,
        velocity,
        ctx.stats.smoothed_ground_normal,
        ctx.host.entity.controller(),
    );

    // Ground normal math can run away on degenerate contacts.
    velocity.clamp_length_max(ctx.params.ground.max_speed)
}
