//! Per-node behaviour of the movement tree.
//!
//! [`StateCtx`] is the handler the [`Hsm`](crate::hsm::Hsm) drives. It
//! borrows everything a state may touch for the duration of one dispatch,
//! including the tick's [`FrameRequest`], and routes each hook to the module
//! owning the node.

use glam::Vec3;

use crate::config::MovementParams;
use crate::host::{Host, LadderMount};
use crate::hsm::{StateHandler, StateId, Transition};
use crate::physics::ActorPhysics;
use crate::request::{FrameMovementParams, FrameRequest};
use crate::stats::MovementStats;
use crate::water::WaterProxy;

mod ancestors;
pub mod dead;
mod fly;
mod ground;
mod intro;
pub mod jump;
mod ladder;
pub mod ledge;
pub mod slide;
pub mod spectate;
mod swim;

use dead::DeadSession;
use ground::GroundSession;
use jump::{AirborneSession, JumpRequest};
use ladder::LadderSession;
use ledge::{LedgeGrab, LedgeSession};
use slide::SlideSession;
use spectate::{SpectateSession, SpectatorMode};
use swim::SwimSession;

/// Events the movement tree reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementEvent {
    /// Compute this tick's movement request.
    PrePhysicsUpdate {
        frame_time: f32,
        movement: FrameMovementParams,
    },
    /// Post-physics update.
    Update { frame_time: f32 },
    Jump,
    Fall,
    Ground,
    Ledge(LedgeGrab),
    LedgeAnimFinished,
    Slide,
    LazyExitSlide,
    ForceExitSlide,
    StanceChanged(crate::host::Stance),
    Ladder(LadderMount),
    LeaveLadder(crate::host::LadderExit),
    /// Height fraction reported by the ladder animation.
    LadderPosition(f32),
    Fly(bool),
    Spectate(SpectatorMode),
    StopSpectate,
    HostMigrationPause(bool),
    IntroStart,
    IntroFinished,
    Dead,
    Revive,
}

/// Transient data owned by the active leaf.
///
/// Built when the owning node is entered and dropped when it exits, so a
/// re-entered state never sees stale data.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Session {
    Ground(GroundSession),
    Airborne(AirborneSession),
    Slide(SlideSession),
    Swim(SwimSession),
    Ledge(LedgeSession),
    Ladder(LadderSession),
    Spectate(SpectateSession),
    Dead(DeadSession),
}

/// Entry data handed from the node requesting a transition to the enter
/// hook of its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PendingEntry {
    Jump(JumpRequest),
    Airborne { velocity: Vec3 },
    Ledge(LedgeGrab),
    Ladder(LadderMount),
    Spectate(SpectatorMode),
    Dead(DeadSession),
}

/// Everything a state may read or write during one dispatch.
pub(crate) struct StateCtx<'m, 'h> {
    pub params: &'m MovementParams,
    pub physics: &'m ActorPhysics,
    pub stats: &'m mut MovementStats,
    pub water: &'m mut WaterProxy,
    pub session: &'m mut Option<Session>,
    pub pending: &'m mut Option<PendingEntry>,
    pub host: &'m mut Host<'h>,
    pub frame: &'m mut FrameRequest,

    /// This tick was already dispatched once and is being retried after a
    /// transition. Ancestors must not accumulate timers twice.
    pub repeat: bool,
}

impl StateCtx<'_, '_> {
    pub fn take_pending_jump(&mut self) -> Option<JumpRequest> {
        match self.pending.take() {
            Some(PendingEntry::Jump(request)) => Some(request),
            other => self.restore_pending(other),
        }
    }

    pub fn take_pending_airborne(&mut self) -> Option<Vec3> {
        match self.pending.take() {
            Some(PendingEntry::Airborne { velocity }) => Some(velocity),
            other => self.restore_pending(other),
        }
    }

    pub fn take_pending_ledge(&mut self) -> Option<LedgeGrab> {
        match self.pending.take() {
            Some(PendingEntry::Ledge(grab)) => Some(grab),
            other => self.restore_pending(other),
        }
    }

    pub fn take_pending_ladder(&mut self) -> Option<LadderMount> {
        match self.pending.take() {
            Some(PendingEntry::Ladder(mount)) => Some(mount),
            other => self.restore_pending(other),
        }
    }

    pub fn take_pending_spectate(&mut self) -> Option<SpectatorMode> {
        match self.pending.take() {
            Some(PendingEntry::Spectate(mode)) => Some(mode),
            other => self.restore_pending(other),
        }
    }

    pub fn take_pending_dead(&mut self) -> Option<DeadSession> {
        match self.pending.take() {
            Some(PendingEntry::Dead(session)) => Some(session),
            other => self.restore_pending(other),
        }
    }

    // Entry data meant for a deeper node stays queued.
    fn restore_pending<T>(&mut self, entry: Option<PendingEntry>) -> Option<T> {
        *self.pending = entry;
        None
    }

    /// Drop the session if it belongs to `state`.
    fn end_session(&mut self, state: StateId) {
        let owned = matches!(
            (state, &*self.session),
            (StateId::Ground, Some(Session::Ground(_)))
                | (StateId::Jump | StateId::GroundFall | StateId::SlideFall, Some(Session::Airborne(_)))
                | (StateId::Slide, Some(Session::Slide(_)))
                | (StateId::Swim, Some(Session::Swim(_)))
                | (StateId::Ledge, Some(Session::Ledge(_)))
                | (StateId::Ladder, Some(Session::Ladder(_)))
                | (StateId::Spectate, Some(Session::Spectate(_)))
                | (StateId::Dead, Some(Session::Dead(_)))
        );
        if owned {
            *self.session = None;
        }
    }
}

impl StateHandler for StateCtx<'_, '_> {
    type Event = MovementEvent;

    fn on_enter(&mut self, state: StateId) -> Transition {
        log::trace!("entity {} enter {:?}", self.host.entity.id(), state);
        match state {
            StateId::Root
            | StateId::GroundMovement
            | StateId::SwimTest
            | StateId::GroundFallTest
            | StateId::SlideFallTest => Transition::Continue,
            StateId::MovementRoot => ancestors::enter_movement_root(self),
            StateId::Ground => ground::enter(self),
            StateId::Jump => jump::enter_jump(self),
            StateId::Fall => jump::enter_fall(self),
            StateId::GroundFall | StateId::SlideFall => jump::enter_falling(self),
            StateId::Slide => slide::enter(self),
            StateId::Swim => swim::enter(self),
            StateId::Ladder => ladder::enter(self),
            StateId::Ledge => ledge::enter(self),
            StateId::Fly => fly::enter(self),
            StateId::Spectate => spectate::enter(self),
            StateId::Dead => dead::enter(self),
            StateId::Intro => intro::enter(self),
        }
    }

    fn on_exit(&mut self, state: StateId) {
        log::trace!("entity {} exit {:?}", self.host.entity.id(), state);
        match state {
            StateId::GroundMovement => ancestors::exit_ground_movement(self),
            StateId::Ground => ground::exit(self),
            StateId::Jump => jump::exit_jump(self),
            StateId::Slide => slide::exit(self),
            StateId::Swim => swim::exit(self),
            StateId::Ladder => ladder::exit(self),
            StateId::Ledge => ledge::exit(self),
            StateId::Fly => fly::exit(self),
            StateId::Spectate => spectate::exit(self),
            StateId::Intro => intro::exit(self),
            _ => {}
        }
        self.end_session(state);
    }

    fn handle(&mut self, state: StateId, active: StateId, event: &MovementEvent) -> Transition {
        match state {
            StateId::Root => ancestors::handle_root(self, active, event),
            StateId::MovementRoot => ancestors::handle_movement_root(self, active, event),
            StateId::GroundMovement => ancestors::handle_ground_movement(self, event),
            StateId::SwimTest => ancestors::handle_swim_test(self, active, event),
            StateId::GroundFallTest => ancestors::handle_ground_fall_test(self, active, event),
            StateId::SlideFallTest => ancestors::handle_slide_fall_test(self, active, event),
            StateId::Ground => ground::handle(self, event),
            StateId::Jump => jump::handle_jump(self, active, event),
            StateId::Fall => Transition::Continue,
            StateId::GroundFall | StateId::SlideFall => jump::handle_falling(self, state, event),
            StateId::Slide => slide::handle(self, event),
            StateId::Swim => swim::handle(self, event),
            StateId::Ladder => ladder::handle(self, event),
            StateId::Ledge => ledge::handle(self, event),
            StateId::Fly => fly::handle(self, event),
            StateId::Spectate => spectate::handle(self, event),
            StateId::Dead => dead::handle(self, event),
            StateId::Intro => intro::handle(self, event),
        }
    }
}
