//! Ledge grabs and vaults.
//!
//! A grab is validated by [`try_ledge_grab`] from Ground, Jump and the fall
//! states. While the Ledge state is active the animation drives the
//! transform; the state blends the player from the grab position to the
//! transition's end position and follows the ledge if it moves.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::{LedgeBlend, MovementParams};
use crate::host::{
    AnimationAction, ControlMethod, LedgeFlags, LedgeId, LedgeInfo, LedgeQuery, LedgeTransition,
    PlayerEntity, Stance,
};
use crate::hsm::{StateId, Transition};
use crate::physics::UP;
use crate::request::RequestKind;
use crate::util;

use super::{MovementEvent, PendingEntry, Session, StateCtx};

/// An accepted grab: which ledge and how to get over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgeGrab {
    pub ledge: LedgeId,
    pub transition: LedgeTransition,
}

/// Yaw-only rotation taking +Y onto the horizontal part of `direction`.
pub fn yaw_towards(direction: Vec3) -> Quat {
    Quat::from_rotation_z((-direction.x).atan2(direction.y))
}

/// Side of the ledge the player is on, as an outward unit vector.
fn resolve_facing(info: &LedgeInfo, position: Vec3) -> Vec3 {
    let facing = Vec3::new(info.facing.x, info.facing.y, 0.0).normalize_or_zero();
    let behind = (position - info.position).dot(facing) < 0.0;
    if behind && info.flags.has(LedgeFlags::DOUBLE_SIDED) {
        -facing
    } else {
        facing
    }
}

/// World position of a ledge-space offset.
fn ledge_point(info: &LedgeInfo, facing: Vec3, offset: Vec3) -> Vec3 {
    info.position + yaw_towards(facing) * offset
}

/// Transition whose anchor is closest to the player.
pub fn best_transition(
    params: &MovementParams,
    info: &LedgeInfo,
    facing: Vec3,
    position: Vec3,
) -> LedgeTransition {
    let distance = |transition: &LedgeTransition| {
        let anchor = params.ledge.transitions.get(*transition).anchor_offset;
        ledge_point(info, facing, anchor).distance_squared(position)
    };
    LedgeTransition::candidates(info.flags)
        .iter()
        .copied()
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
        .unwrap_or(LedgeTransition::PullUp)
}

/// Look for a ledge the player can grab right now.
///
/// `expected_end_height` is the apex the current jump can reach and
/// `start_height` where the jump started. Ledges above the apex plus the
/// clear height are out of reach, except vault ledges within vault reach of
/// a sprint jump.
pub fn try_ledge_grab(
    params: &MovementParams,
    entity: &dyn PlayerEntity,
    ledges: &dyn LedgeQuery,
    expected_end_height: f32,
    start_height: f32,
    sprint_jump: bool,
) -> Option<LedgeGrab> {
    let tuning = &params.ledge;
    if !tuning.enabled || entity.stance() == Stance::Prone {
        return None;
    }

    let position = entity.world_position();
    let probe = position + UP * params.body.eye_height;
    let id = ledges.find_nearest_ledge(probe, tuning.search_radius)?;
    let info = ledges.ledge(id)?;

    let facing = resolve_facing(&info, position);
    let forward = entity.world_rotation() * Vec3::Y;
    let forward = Vec3::new(forward.x, forward.y, 0.0).normalize_or_zero();
    if forward.dot(-facing) < tuning.max_approach_angle.to_radians().cos() {
        return None;
    }

    let height = info.position.z;
    if height < position.z + tuning.min_height {
        return None;
    }
    if height > expected_end_height + tuning.clear_height {
        let vault = info.flags.has(LedgeFlags::VAULT) || info.flags.has(LedgeFlags::HIGH_VAULT);
        let within_vault_reach = height <= start_height + tuning.vault_reach_height;
        if !(vault && sprint_jump && within_vault_reach) {
            return None;
        }
    }

    Some(LedgeGrab {
        ledge: id,
        transition: best_transition(params, &info, facing, position),
    })
}

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LedgeSession {
    pub grab: LedgeGrab,
    pub blend: LedgeBlend,
    pub facing: Vec3,
    pub start_position: Vec3,
    pub target_rotation: Quat,
    pub last_ledge_position: Vec3,
    pub elapsed: f32,

    /// Leave into GroundFall instead of Ground.
    pub end_falling: bool,
}

fn session<'a>(ctx: &'a mut StateCtx<'_, '_>) -> Option<&'a mut LedgeSession> {
    match ctx.session.as_mut() {
        Some(Session::Ledge(session)) => Some(session),
        _ => None,
    }
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    let Some(grab) = ctx.take_pending_ledge() else {
        debug_assert!(false, "ledge state entered without a grab");
        return Transition::To(StateId::MovementRoot);
    };
    let info = ctx.host.ledges.ledge(grab.ledge);
    debug_assert!(info.is_some(), "ledge grab with unknown ledge id {}", grab.ledge);
    let Some(info) = info else {
        return Transition::To(StateId::MovementRoot);
    };

    let position = ctx.host.entity.world_position();
    let facing = resolve_facing(&info, position);
    let blend = *ctx.params.ledge.transitions.get(grab.transition);
    let end_falling = blend.end_falling || info.flags.has(LedgeFlags::ENDS_IN_AIR);

    log::debug!(
        "entity {} grabs ledge {} ({:?})",
        ctx.host.entity.id(),
        grab.ledge,
        grab.transition
    );

    *ctx.session = Some(Session::Ledge(LedgeSession {
        grab,
        blend,
        facing,
        start_position: position,
        target_rotation: yaw_towards(-facing),
        last_ledge_position: info.position,
        elapsed: 0.0,
        end_falling,
    }));

    ctx.host.set_control_method(ControlMethod::Animation);
    ctx.host.queue_action(AnimationAction::LedgeGrab {
        transition: grab.transition,
        duration: blend.anim_duration,
    });
    util::phy_set_fly(ctx.params, ctx.host.entity, false);
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    ctx.host.set_control_method(ControlMethod::Entity);
    util::phy_set_no_fly(ctx.params, ctx.host.entity);
}

fn finish(ctx: &mut StateCtx) -> Transition {
    let Some(session) = session(ctx) else {
        return Transition::To(StateId::GroundMovement);
    };
    if session.end_falling {
        let velocity = yaw_towards(session.facing) * session.blend.exit_velocity;
        *ctx.pending = Some(PendingEntry::Airborne { velocity });
        Transition::To(StateId::GroundFall)
    } else {
        Transition::To(StateId::GroundMovement)
    }
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { frame_time, .. } => pre_physics(ctx, frame_time),
        MovementEvent::LedgeAnimFinished => finish(ctx),
        // Another grab while hanging is ignored.
        MovementEvent::Ledge(_) => Transition::Done,
        _ => Transition::Continue,
    }
}

fn pre_physics(ctx: &mut StateCtx, frame_time: f32) -> Transition {
    let ledges = ctx.host.ledges;
    let position = ctx.host.entity.world_position();
    let rotation = ctx.host.entity.world_rotation();

    let Some(session) = session(ctx) else {
        return Transition::Continue;
    };
    // A ledge that vanished mid-grab leaves the player hanging this tick.
    let Some(info) = ledges.ledge(session.grab.ledge) else {
        return Transition::Continue;
    };

    // Ride moving ledges.
    let delta = info.position - session.last_ledge_position;
    session.last_ledge_position = info.position;
    session.start_position += delta;
    session.elapsed += frame_time;

    let blend = session.blend;
    let t = (session.elapsed / blend.move_duration.max(f32::EPSILON)).clamp(0.0, 1.0);
    let eased = t * t * (3.0 - 2.0 * t);
    let end = ledge_point(&info, session.facing, blend.end_offset);
    let target = session.start_position.lerp(end, eased);

    let remaining = (blend.move_duration - session.elapsed + frame_time).max(frame_time);
    let turn = (frame_time / remaining).clamp(0.0, 1.0);
    let turn = Quat::IDENTITY.slerp(rotation.inverse() * session.target_rotation, turn);
    let done = session.elapsed >= blend.anim_duration;

    let velocity = if frame_time > 0.0 {
        (target - position) / frame_time
    } else {
        Vec3::ZERO
    };
    let request = ctx.frame.write();
    request.kind = RequestKind::Fly;
    request.velocity = velocity;
    request.rotation = turn;

    if done {
        return finish(ctx);
    }
    Transition::Continue
}
