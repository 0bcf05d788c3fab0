//! Spectator camera movement.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::SpectateParams;
use crate::hsm::{StateId, Transition};
use crate::util;

use super::fly::{free_flight_velocity, write_flight};
use super::{MovementEvent, Session, StateCtx};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectatorMode {
    /// Free camera.
    #[default]
    Free,
    /// Camera locked in place.
    Fixed,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpectateSession {
    pub mode: SpectatorMode,

    /// Screen fade alpha, 1 = black.
    pub fade: f32,

    /// Host migration in progress; the screen stays black.
    pub paused: bool,
}

impl SpectateSession {
    pub fn new(mode: SpectatorMode) -> Self {
        Self {
            mode,
            fade: 1.0,
            paused: false,
        }
    }

    /// Advance the fade-in. Returns the new alpha.
    pub fn advance_fade(&mut self, params: &SpectateParams, frame_time: f32) -> f32 {
        if self.paused {
            self.fade = 1.0;
        } else if params.fade_time > 0.0 {
            self.fade = (self.fade - frame_time / params.fade_time).max(0.0);
        } else {
            self.fade = 0.0;
        }
        self.fade
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        // Both pausing and resuming restart from black.
        self.fade = 1.0;
    }
}

fn session<'a>(ctx: &'a mut StateCtx<'_, '_>) -> Option<&'a mut SpectateSession> {
    match ctx.session.as_mut() {
        Some(Session::Spectate(session)) => Some(session),
        _ => None,
    }
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    let mode = ctx.take_pending_spectate().unwrap_or_default();
    log::debug!("entity {} spectates ({:?})", ctx.host.entity.id(), mode);

    *ctx.session = Some(Session::Spectate(SpectateSession::new(mode)));
    ctx.host.screen_fade(1.0);
    util::phy_set_fly(ctx.params, ctx.host.entity, false);
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    ctx.host.screen_fade(0.0);
    util::phy_set_no_fly(ctx.params, ctx.host.entity);
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { movement, .. } => {
            let mode = match session(ctx) {
                Some(session) => session.mode,
                None => SpectatorMode::Free,
            };
            let velocity = match mode {
                SpectatorMode::Free => free_flight_velocity(
                    ctx.host.entity.view_rotation(),
                    &movement,
                    ctx.params.spectate.speed,
                    ctx.params.fly.sprint_multiplier,
                ),
                SpectatorMode::Fixed => Vec3::ZERO,
            };
            write_flight(ctx, velocity, &movement);
            Transition::Continue
        }
        MovementEvent::Update { frame_time } => {
            let params = ctx.params;
            let fade = session(ctx).map(|session| session.advance_fade(&params.spectate, frame_time));
            if let Some(fade) = fade {
                ctx.host.screen_fade(fade);
            }
            Transition::Continue
        }
        MovementEvent::HostMigrationPause(paused) => {
            if let Some(session) = session(ctx) {
                session.set_paused(paused);
            }
            ctx.host.screen_fade(1.0);
            Transition::Done
        }
        MovementEvent::Spectate(mode) => {
            if let Some(session) = session(ctx) {
                session.mode = mode;
            }
            Transition::Done
        }
        MovementEvent::StopSpectate => Transition::To(StateId::MovementRoot),
        _ => Transition::Continue,
    }
}
