//! Airborne locomotion: Jump, its Fall child, GroundFall and SlideFall.
//!
//! All four leaves share [`AirborneSession`]. Jump owns it for itself and
//! its Fall child, the two fall leaves own their own. Inside a jump the
//! phase goes `None -> Jump -> Falling`; leaving the ascending phase moves
//! the tree from Jump to Fall.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{JumpParams, MovementParams};
use crate::hsm::{StateId, Transition};
use crate::request::{FrameMovementParams, RequestKind};
use crate::util::{self, MoveEnvironment};

use super::ledge::try_ledge_grab;
use super::{MovementEvent, PendingEntry, Session, StateCtx};

/// Kind of jump being started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpKind {
    Standard,
    Sprint,
    /// Breaking the water surface at speed.
    Dolphin,
}

/// Entry data for the Jump state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpRequest {
    pub kind: JumpKind,

    /// Upward speed at takeoff (meters/second).
    pub vertical_speed: f32,

    /// Apex height above takeoff.
    pub height: f32,
}

impl JumpRequest {
    pub fn standard(params: &MovementParams) -> Self {
        Self::with_height(params, JumpKind::Standard, params.jump.height)
    }

    pub fn sprint(params: &MovementParams) -> Self {
        let height = params.jump.height + params.jump.sprint_height_bonus;
        Self::with_height(params, JumpKind::Sprint, height)
    }

    pub fn dolphin(params: &MovementParams, vertical_speed: f32) -> Self {
        let vertical_speed = vertical_speed.max(0.0);
        Self {
            kind: JumpKind::Dolphin,
            vertical_speed,
            height: vertical_speed * vertical_speed / (2.0 * params.body.gravity),
        }
    }

    fn with_height(params: &MovementParams, kind: JumpKind, height: f32) -> Self {
        Self {
            kind,
            vertical_speed: JumpParams::launch_speed(height, params.body.gravity),
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpPhase {
    #[default]
    None,
    /// Ascending and input controlled.
    Jump,
    /// Ballistic.
    Falling,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AirborneSession {
    pub phase: JumpPhase,
    pub start_height: f32,

    /// Highest point the current jump can reach.
    pub expected_end_height: f32,

    pub sprint_jump: bool,

    /// Velocity change sent on the first tick as a `JumpAccumulate` request.
    pub impulse: Option<Vec3>,

    pub airborne_ticks: u32,
}

fn session<'a>(ctx: &'a mut StateCtx<'_, '_>) -> Option<&'a mut AirborneSession> {
    match ctx.session.as_mut() {
        Some(Session::Airborne(session)) => Some(session),
        _ => None,
    }
}

// ============================================================================
// Enter / exit
// ============================================================================

pub(super) fn enter_jump(ctx: &mut StateCtx) -> Transition {
    let request = ctx
        .take_pending_jump()
        .unwrap_or_else(|| JumpRequest::standard(ctx.params));
    let position = ctx.host.entity.world_position();
    let current = ctx.physics.velocity;

    // Horizontal momentum is kept; only the vertical speed is topped up.
    let impulse = Vec3::Z * (request.vertical_speed - current.z).max(0.0);

    log::debug!(
        "entity {} jump {:?} ({:.2} m/s, apex {:.2} m)",
        ctx.host.entity.id(),
        request.kind,
        request.vertical_speed,
        request.height
    );

    ctx.stats.is_jumping = true;
    *ctx.session = Some(Session::Airborne(AirborneSession {
        phase: JumpPhase::Jump,
        start_height: position.z,
        expected_end_height: position.z + request.height,
        sprint_jump: request.kind == JumpKind::Sprint,
        impulse: Some(impulse),
        airborne_ticks: 0,
    }));
    Transition::Continue
}

pub(super) fn enter_fall(ctx: &mut StateCtx) -> Transition {
    if let Some(session) = session(ctx) {
        session.phase = JumpPhase::Falling;
    }
    Transition::Continue
}

pub(super) fn exit_jump(ctx: &mut StateCtx) {
    ctx.stats.is_jumping = false;
}

/// GroundFall and SlideFall.
pub(super) fn enter_falling(ctx: &mut StateCtx) -> Transition {
    let carried = ctx.take_pending_airborne();
    let position = ctx.host.entity.world_position();
    let current = ctx.physics.velocity;

    let impulse = carried.map(|velocity| {
        Vec3::new(
            velocity.x - current.x,
            velocity.y - current.y,
            (velocity.z - current.z).max(0.0),
        )
    });

    *ctx.session = Some(Session::Airborne(AirborneSession {
        phase: JumpPhase::Falling,
        start_height: position.z,
        expected_end_height: position.z,
        sprint_jump: false,
        impulse,
        airborne_ticks: 0,
    }));
    Transition::Continue
}

// ============================================================================
// Events
// ============================================================================

/// Jump node, shared with its Fall child.
pub(super) fn handle_jump(ctx: &mut StateCtx, active: StateId, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { movement, .. } => airborne_update(ctx, active, &movement),
        MovementEvent::Fall if active == StateId::Jump => Transition::To(StateId::Fall),
        MovementEvent::Ground => land(ctx, active),
        _ => Transition::Continue,
    }
}

/// GroundFall and SlideFall leaves.
pub(super) fn handle_falling(ctx: &mut StateCtx, state: StateId, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { movement, .. } => airborne_update(ctx, state, &movement),
        MovementEvent::Ground => land(ctx, state),
        // Falling swallows further fall requests.
        MovementEvent::Fall => Transition::Done,
        _ => Transition::Continue,
    }
}

fn airborne_update(ctx: &mut StateCtx, active: StateId, movement: &FrameMovementParams) -> Transition {
    let on_ground = ctx.physics.on_ground();
    let vertical = ctx.physics.velocity.z;
    let Some(airborne) = session(ctx) else {
        return Transition::Continue;
    };

    if airborne.airborne_ticks > 0 && on_ground {
        return land(ctx, active);
    }

    if airborne.phase == JumpPhase::Jump && vertical < 0.0 {
        airborne.phase = JumpPhase::Falling;
        if active == StateId::Jump {
            return Transition::To(StateId::Fall);
        }
    }

    let expected_end = airborne.expected_end_height;
    let start = airborne.start_height;
    let sprint_jump = airborne.sprint_jump;

    if let Some(grab) = try_ledge_grab(
        ctx.params,
        ctx.host.entity,
        ctx.host.ledges,
        expected_end,
        start,
        sprint_jump,
    ) {
        *ctx.pending = Some(PendingEntry::Ledge(grab));
        return Transition::To(StateId::Ledge);
    }

    let env = MoveEnvironment::from_entity(ctx.host.entity, ctx.stats);
    let desired = util::calculate_ground_or_jump_movement(
        &ctx.params.speed,
        ctx.host.entity.base_rotation(),
        movement,
        &env,
    );
    let current = ctx.physics.horizontal_velocity();
    let horizontal = current.lerp(desired, ctx.params.jump.air_control.clamp(0.0, 1.0));

    let Some(session) = session(ctx) else {
        return Transition::Continue;
    };
    let impulse = session.impulse.take();
    session.airborne_ticks += 1;

    let request = ctx.frame.write();
    match impulse {
        Some(impulse) => {
            request.kind = RequestKind::JumpAccumulate;
            request.velocity = impulse;
        }
        None => {
            request.kind = RequestKind::Normal;
            request.velocity = Vec3::new(horizontal.x, horizontal.y, 0.0);
        }
    }
    util::process_turning(request, movement);
    Transition::Continue
}

fn land(ctx: &mut StateCtx, state: StateId) -> Transition {
    let position = ctx.host.entity.world_position();
    let start = session(ctx).map_or(position.z, |session| session.start_height);

    util::apply_fall_damage(
        ctx.params,
        ctx.host.entity,
        ctx.physics,
        ctx.water,
        start,
        position.z,
    );
    ctx.stats.is_jumping = false;
    log::trace!("entity {} landed from {:?}", ctx.host.entity.id(), state);

    let keep_sliding = state == StateId::SlideFall
        && ctx.physics.horizontal_velocity().length() > ctx.params.slide.exit_speed;
    if keep_sliding {
        Transition::To(StateId::Slide)
    } else {
        Transition::To(StateId::Ground)
    }
}
