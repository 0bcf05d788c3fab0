//! Level intro: the animation owns the player until it finishes.

use crate::host::{AnimationAction, ControlMethod};
use crate::hsm::{StateId, Transition};

use super::{MovementEvent, StateCtx};

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    log::debug!("entity {} intro", ctx.host.entity.id());
    ctx.host.set_control_method(ControlMethod::Animation);
    ctx.host.queue_action(AnimationAction::Intro);
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    ctx.host.set_control_method(ControlMethod::Entity);
}

pub(super) fn handle(_ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::IntroFinished => Transition::To(StateId::MovementRoot),
        MovementEvent::Dead | MovementEvent::Spectate(_) => Transition::Continue,
        _ => Transition::Done,
    }
}
