//! Ladder climbing.

use glam::Vec3;

use crate::config::LadderParams;
use crate::host::{AnimationAction, LadderExit, LadderMount};
use crate::hsm::{StateId, Transition};
use crate::physics::UP;
use crate::request::{FrameMovementParams, RequestKind};
use crate::util;

use super::{MovementEvent, PendingEntry, Session, StateCtx};

/// How far past the top rung the dismount steps onto the landing.
const TOP_STEP_OFF: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LadderStep {
    Climbing,
    ReachedTop,
    ReachedBottom,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LadderSession {
    pub mount: LadderMount,

    /// Horizontal position the climber hangs at.
    pub anchor: Vec3,

    /// 0 at the bottom rung, 1 at the top.
    pub height_fraction: f32,

    /// Remaining time of a top dismount.
    pub dismount: Option<f32>,
}

impl LadderSession {
    pub fn new(mount: LadderMount, position: Vec3) -> Self {
        let height_fraction = if mount.height > 0.0 {
            ((position.z - mount.bottom.z) / mount.height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            mount,
            anchor: Vec3::new(position.x, position.y, 0.0),
            height_fraction,
            dismount: None,
        }
    }

    /// Climb by `climb` (input in `[-1, 1]`) for one tick.
    pub fn advance(&mut self, params: &LadderParams, climb: f32, frame_time: f32) -> LadderStep {
        let climb = climb.clamp(-1.0, 1.0);
        if climb > 0.0 && self.height_fraction >= 1.0 {
            return LadderStep::ReachedTop;
        }
        if climb < 0.0 && self.height_fraction <= 0.0 {
            return LadderStep::ReachedBottom;
        }
        if self.mount.height > 0.0 {
            let delta = climb * params.climb_speed * frame_time / self.mount.height;
            self.height_fraction = (self.height_fraction + delta).clamp(0.0, 1.0);
        }
        LadderStep::Climbing
    }

    /// Where the climber's feet belong.
    pub fn rung_position(&self) -> Vec3 {
        Vec3::new(
            self.anchor.x,
            self.anchor.y,
            self.mount.bottom.z + self.height_fraction * self.mount.height,
        )
    }

    /// Landing spot of a top dismount.
    pub fn top_exit(&self) -> Vec3 {
        let top = self.mount.bottom + UP * self.mount.height;
        let away = Vec3::new(self.mount.facing.x, self.mount.facing.y, 0.0).normalize_or_zero();
        top - away * TOP_STEP_OFF
    }
}

fn session<'a>(ctx: &'a mut StateCtx<'_, '_>) -> Option<&'a mut LadderSession> {
    match ctx.session.as_mut() {
        Some(Session::Ladder(session)) => Some(session),
        _ => None,
    }
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    let Some(mount) = ctx.take_pending_ladder() else {
        log::warn!("entity {} entered ladder without a mount", ctx.host.entity.id());
        return Transition::To(StateId::MovementRoot);
    };
    let session = LadderSession::new(mount, ctx.host.entity.world_position());
    log::debug!(
        "entity {} mounts ladder at {:.0}%",
        ctx.host.entity.id(),
        session.height_fraction * 100.0
    );

    *ctx.session = Some(Session::Ladder(session));
    util::phy_set_fly(ctx.params, ctx.host.entity, false);
    ctx.host.queue_action(AnimationAction::LadderEnter);
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    util::phy_set_no_fly(ctx.params, ctx.host.entity);
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { frame_time, movement } => {
            pre_physics(ctx, frame_time, &movement)
        }
        MovementEvent::LeaveLadder(how) => leave(ctx, how),
        MovementEvent::LadderPosition(fraction) => {
            if let Some(session) = session(ctx) {
                session.height_fraction = fraction.clamp(0.0, 1.0);
            }
            Transition::Done
        }
        // Already climbing.
        MovementEvent::Ladder(_) | MovementEvent::Jump => Transition::Done,
        _ => Transition::Continue,
    }
}

fn leave(ctx: &mut StateCtx, how: LadderExit) -> Transition {
    let params = ctx.params;
    let Some(session) = session(ctx) else {
        return Transition::To(StateId::GroundMovement);
    };

    match how {
        LadderExit::Drop => {
            let velocity = session.mount.facing * params.ladder.drop_push_speed;
            *ctx.pending = Some(PendingEntry::Airborne { velocity });
            ctx.host.queue_action(AnimationAction::LadderExit(LadderExit::Drop));
            Transition::To(StateId::GroundFall)
        }
        LadderExit::Top => {
            if session.dismount.is_none() {
                session.dismount = Some(params.ladder.top_dismount_time);
                ctx.host.queue_action(AnimationAction::LadderExit(LadderExit::Top));
            }
            Transition::Done
        }
        LadderExit::Bottom => {
            ctx.host.queue_action(AnimationAction::LadderExit(LadderExit::Bottom));
            Transition::To(StateId::GroundMovement)
        }
    }
}

fn pre_physics(ctx: &mut StateCtx, frame_time: f32, movement: &FrameMovementParams) -> Transition {
    if movement.jump {
        return leave(ctx, LadderExit::Drop);
    }

    let params = ctx.params;
    let position = ctx.host.entity.world_position();
    let Some(session) = session(ctx) else {
        return Transition::Continue;
    };

    let exit = session.top_exit();
    let target = match session.dismount.as_mut() {
        Some(remaining) => {
            *remaining -= frame_time;
            if *remaining <= 0.0 {
                return Transition::To(StateId::GroundMovement);
            }
            let step = (frame_time / (*remaining + frame_time)).clamp(0.0, 1.0);
            position.lerp(exit, step)
        }
        None => match session.advance(&params.ladder, movement.desired_velocity.y, frame_time) {
            LadderStep::Climbing => session.rung_position(),
            LadderStep::ReachedTop => return leave(ctx, LadderExit::Top),
            LadderStep::ReachedBottom => return leave(ctx, LadderExit::Bottom),
        },
    };

    let velocity = if frame_time > 0.0 {
        (target - position) / frame_time
    } else {
        Vec3::ZERO
    };
    let request = ctx.frame.write();
    request.kind = RequestKind::Fly;
    request.velocity = velocity;
    util::process_turning(request, movement);
    Transition::Continue
}
