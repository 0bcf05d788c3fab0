//! Dead: no locomotion until revived.

use serde::{Deserialize, Serialize};

use crate::config::DeadParams;
use crate::hsm::{StateId, Transition};

use super::{MovementEvent, Session, StateCtx};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorpseStatus {
    #[default]
    WaitingForSwap,
    Swapped,
}

/// Persisted with the movement state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadSession {
    /// Time left until the ragdoll is swapped for a corpse.
    pub corpse_timer: f32,
    pub status: CorpseStatus,
}

impl DeadSession {
    pub fn new(params: &DeadParams) -> Self {
        Self {
            corpse_timer: params.corpse_swap_delay,
            status: CorpseStatus::WaitingForSwap,
        }
    }

    /// Count down. Returns true on the tick the swap is due.
    pub fn tick(&mut self, frame_time: f32) -> bool {
        if self.status == CorpseStatus::Swapped {
            return false;
        }
        self.corpse_timer -= frame_time;
        if self.corpse_timer <= 0.0 {
            self.corpse_timer = 0.0;
            self.status = CorpseStatus::Swapped;
            return true;
        }
        false
    }
}

fn session<'a>(ctx: &'a mut StateCtx<'_, '_>) -> Option<&'a mut DeadSession> {
    match ctx.session.as_mut() {
        Some(Session::Dead(session)) => Some(session),
        _ => None,
    }
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    let session = ctx
        .take_pending_dead()
        .unwrap_or_else(|| DeadSession::new(&ctx.params.dead));

    ctx.stats.is_jumping = false;
    ctx.stats.is_sprinting = false;
    ctx.stats.is_sliding = false;
    *ctx.session = Some(Session::Dead(session));
    Transition::Continue
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::Update { frame_time } => {
            let swap = session(ctx).is_some_and(|session| session.tick(frame_time));
            if swap {
                log::debug!("entity {} swaps to corpse", ctx.host.entity.id());
                ctx.host.entity.swap_to_corpse();
            }
            Transition::Done
        }
        MovementEvent::Revive => {
            log::debug!("entity {} revived", ctx.host.entity.id());
            Transition::To(StateId::MovementRoot)
        }
        // The few global events a corpse still follows.
        MovementEvent::Spectate(_) | MovementEvent::StopSpectate | MovementEvent::IntroStart => {
            Transition::Continue
        }
        // No request is written: the corpse does not move itself.
        _ => Transition::Done,
    }
}
