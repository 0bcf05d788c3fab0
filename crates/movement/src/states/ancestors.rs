//! Interior nodes: behaviour shared by every leaf below them.
//!
//! Dispatch runs leaf first, so everything here sees the event after the
//! active leaf passed it on. Sprint and water stats refreshed here are
//! therefore read by the leaf on the following tick.

use crate::host::ControlMethod;
use crate::hsm::{StateId, Transition};
use crate::util;

use super::jump::JumpRequest;
use super::{slide, MovementEvent, PendingEntry, Session, StateCtx};

// ============================================================================
// Root
// ============================================================================

/// Global events reachable from any branch.
pub(super) fn handle_root(ctx: &mut StateCtx, active: StateId, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::Dead if active != StateId::Dead => {
            log::debug!("entity {} died in {:?}", ctx.host.entity.id(), active);
            Transition::To(StateId::Dead)
        }
        MovementEvent::Fly(true) if active != StateId::Fly => Transition::To(StateId::Fly),
        MovementEvent::Spectate(mode) => {
            *ctx.pending = Some(PendingEntry::Spectate(mode));
            Transition::To(StateId::Spectate)
        }
        MovementEvent::IntroStart if active != StateId::Intro => Transition::To(StateId::Intro),
        _ => Transition::Continue,
    }
}

// ============================================================================
// MovementRoot
// ============================================================================

pub(super) fn enter_movement_root(ctx: &mut StateCtx) -> Transition {
    util::phy_set_no_fly(ctx.params, ctx.host.entity);
    ctx.host.set_control_method(ControlMethod::Entity);
    Transition::Continue
}

pub(super) fn handle_movement_root(
    ctx: &mut StateCtx,
    active: StateId,
    event: &MovementEvent,
) -> Transition {
    match *event {
        MovementEvent::Update { frame_time } => {
            ctx.stats.advance(ctx.physics, frame_time);
            Transition::Continue
        }
        MovementEvent::Ledge(grab) => {
            *ctx.pending = Some(PendingEntry::Ledge(grab));
            Transition::To(StateId::Ledge)
        }
        MovementEvent::Ladder(mount) if active != StateId::Ladder => {
            *ctx.pending = Some(PendingEntry::Ladder(mount));
            Transition::To(StateId::Ladder)
        }
        _ => Transition::Continue,
    }
}

// ============================================================================
// GroundMovement
// ============================================================================

pub(super) fn handle_ground_movement(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    if let MovementEvent::PrePhysicsUpdate { frame_time, movement } = *event {
        if !ctx.repeat {
            ctx.stats.track_forward_movement(&movement, frame_time);
        }

        let sprinting = util::should_sprint(
            ctx.params,
            ctx.stats,
            ctx.host.entity.controller(),
            ctx.host.entity.current_item(),
            &movement,
        );
        if sprinting != ctx.stats.is_sprinting {
            log::trace!("entity {} sprinting={}", ctx.host.entity.id(), sprinting);
        }
        ctx.stats.is_sprinting = sprinting;
    }
    Transition::Continue
}

pub(super) fn exit_ground_movement(ctx: &mut StateCtx) {
    ctx.stats.is_sprinting = false;
    ctx.stats.forward_move_time = 0.0;
}

// ============================================================================
// SwimTest
// ============================================================================

pub(super) fn handle_swim_test(ctx: &mut StateCtx, active: StateId, event: &MovementEvent) -> Transition {
    let MovementEvent::PrePhysicsUpdate { frame_time, .. } = *event else {
        return Transition::Continue;
    };

    let position = ctx.host.entity.world_position();
    let frame_time = if ctx.repeat { 0.0 } else { frame_time };
    ctx.water.update(ctx.params, position, ctx.host.water, frame_time);

    // Leaving the water on a dolphin jump must not pull the jumper back in.
    let rising_jump = active == StateId::Jump && ctx.physics.velocity.z > 0.0;
    if ctx.water.should_swim(ctx.params) && !rising_jump {
        return Transition::To(StateId::Swim);
    }
    Transition::Continue
}

// ============================================================================
// GroundFallTest / SlideFallTest
// ============================================================================

/// Airborne long enough to fall. Actors wedged in geometry never fall.
fn lost_ground(ctx: &StateCtx) -> bool {
    let flags = ctx.physics.flags;
    flags.flying() && !flags.stuck() && ctx.stats.in_air_time >= ctx.params.ground.fall_test_time
}

fn jump_request(ctx: &StateCtx) -> JumpRequest {
    if ctx.stats.is_sprinting {
        JumpRequest::sprint(ctx.params)
    } else {
        JumpRequest::standard(ctx.params)
    }
}

pub(super) fn handle_ground_fall_test(
    ctx: &mut StateCtx,
    active: StateId,
    event: &MovementEvent,
) -> Transition {
    let on_ground = active == StateId::Ground;
    match *event {
        MovementEvent::PrePhysicsUpdate { .. } if on_ground && lost_ground(ctx) => {
            Transition::To(StateId::GroundFall)
        }
        MovementEvent::Jump if on_ground && !ctx.stats.is_jumping => {
            *ctx.pending = Some(PendingEntry::Jump(jump_request(ctx)));
            Transition::To(StateId::Jump)
        }
        MovementEvent::Slide if on_ground && slide::can_start(ctx) => {
            Transition::To(StateId::SlideFallTest)
        }
        MovementEvent::Fall if on_ground => Transition::To(StateId::GroundFall),
        MovementEvent::Ground if active == StateId::GroundFall => Transition::To(StateId::Ground),
        _ => Transition::Continue,
    }
}

pub(super) fn handle_slide_fall_test(
    ctx: &mut StateCtx,
    active: StateId,
    event: &MovementEvent,
) -> Transition {
    let sliding = active == StateId::Slide;
    match *event {
        MovementEvent::PrePhysicsUpdate { .. } if sliding && lost_ground(ctx) => {
            if let Some(Session::Slide(session)) = &*ctx.session {
                *ctx.pending = Some(PendingEntry::Airborne {
                    velocity: session.controller.velocity,
                });
            }
            Transition::To(StateId::SlideFall)
        }
        MovementEvent::Jump if sliding => {
            *ctx.pending = Some(PendingEntry::Jump(JumpRequest::standard(ctx.params)));
            Transition::To(StateId::Jump)
        }
        MovementEvent::Fall if sliding => Transition::To(StateId::SlideFall),
        _ => Transition::Continue,
    }
}
