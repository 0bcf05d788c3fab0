//! Free flight (debug and editor movement).

use glam::{Quat, Vec3};

use crate::hsm::{StateId, Transition};
use crate::request::{FrameMovementParams, RequestKind};
use crate::util;

use super::{MovementEvent, StateCtx};

/// Velocity along the camera for free-flying states.
pub(super) fn free_flight_velocity(
    view: Quat,
    movement: &FrameMovementParams,
    speed: f32,
    sprint_multiplier: f32,
) -> Vec3 {
    let mut speed = speed;
    if movement.wants_sprint() {
        speed *= sprint_multiplier;
    }
    view * movement.desired_velocity.clamp_length_max(1.0) * speed
}

/// Write a free-flight request for this tick.
pub(super) fn write_flight(ctx: &mut StateCtx, velocity: Vec3, movement: &FrameMovementParams) {
    let request = ctx.frame.write();
    request.kind = RequestKind::Fly;
    request.velocity = velocity;
    util::process_turning(request, movement);
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    log::debug!("entity {} fly on", ctx.host.entity.id());
    util::phy_set_fly(ctx.params, ctx.host.entity, false);
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    util::phy_set_no_fly(ctx.params, ctx.host.entity);
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { movement, .. } => {
            let velocity = free_flight_velocity(
                ctx.host.entity.view_rotation(),
                &movement,
                ctx.params.fly.speed,
                ctx.params.fly.sprint_multiplier,
            );
            write_flight(ctx, velocity, &movement);
            Transition::Continue
        }
        MovementEvent::Fly(true) => Transition::Done,
        MovementEvent::Fly(false) => {
            log::debug!("entity {} fly off", ctx.host.entity.id());
            Transition::To(StateId::MovementRoot)
        }
        // Flying ignores ground locomotion events.
        MovementEvent::Jump
        | MovementEvent::Fall
        | MovementEvent::Ground
        | MovementEvent::Slide
        | MovementEvent::Ledge(_)
        | MovementEvent::Ladder(_) => Transition::Done,
        _ => Transition::Continue,
    }
}
