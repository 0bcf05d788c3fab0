//! Swimming on and below the water surface.

use glam::{Quat, Vec3};

use crate::config::MovementParams;
use crate::host::SwimCue;
use crate::hsm::{StateId, Transition};
use crate::request::{FrameMovementParams, RequestKind};
use crate::util;

use super::jump::JumpRequest;
use super::{MovementEvent, PendingEntry, Session, StateCtx};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SwimSession {
    /// Head level with the surface last tick.
    pub on_surface: bool,

    pub head_was_underwater: bool,
    pub head_underwater_time: f32,

    /// Water height last tick, for wave riding.
    pub last_water_level: Option<f32>,
}

impl SwimSession {
    /// Track the head crossing the surface. Returns the cues of this tick.
    pub fn track_head(
        &mut self,
        params: &MovementParams,
        head_underwater: bool,
        frame_time: f32,
    ) -> [Option<SwimCue>; 2] {
        let mut cues = [None, None];
        if head_underwater {
            if !self.head_was_underwater {
                cues[0] = Some(SwimCue::HeadUnderwater);
            }
            self.head_underwater_time += frame_time;
        } else if self.head_was_underwater {
            let underwater_time = self.head_underwater_time;
            cues[0] = Some(SwimCue::HeadAboveWater { underwater_time });
            if underwater_time >= params.swim.breath_gasp_time {
                cues[1] = Some(SwimCue::GaspForBreath);
            }
            self.head_underwater_time = 0.0;
        }
        self.head_was_underwater = head_underwater;
        cues
    }
}

fn session<'a>(ctx: &'a mut StateCtx<'_, '_>) -> Option<&'a mut SwimSession> {
    match ctx.session.as_mut() {
        Some(Session::Swim(session)) => Some(session),
        _ => None,
    }
}

fn surfaced(params: &MovementParams, relative_water_level: f32) -> bool {
    relative_water_level > -params.swim.dolphin_jump_depth
}

/// Breaking the surface fast enough turns into a jump.
fn dolphin_jump(
    params: &MovementParams,
    was_on_surface: bool,
    relative_water_level: f32,
    vertical_speed: f32,
) -> Option<JumpRequest> {
    let breaking_surface = !was_on_surface && surfaced(params, relative_water_level);
    if breaking_surface && vertical_speed > params.swim.dolphin_jump_threshold {
        Some(JumpRequest::dolphin(
            params,
            vertical_speed * params.swim.dolphin_jump_modifier,
        ))
    } else {
        None
    }
}

/// Velocity the input asks for, along the camera.
fn desired_velocity(params: &MovementParams, view: Quat, movement: &FrameMovementParams) -> Vec3 {
    let input = movement.desired_velocity.clamp_length_max(1.0);
    let mut speed = params.swim.speed;
    if movement.wants_sprint() && input.y > 0.0 {
        speed *= params.swim.sprint_multiplier;
    }

    let mut desired = view * input * speed;
    if desired.z > 0.0 {
        desired.z *= params.swim.look_up_multiplier;
    }
    desired
}

/// Vertical velocity while riding the surface.
fn surface_vertical_speed(
    params: &MovementParams,
    relative_water_level: f32,
    wave_speed: f32,
    desired_z: f32,
) -> f32 {
    let spring = (params.swim.surface_float_level - relative_water_level) * params.swim.surface_spring;
    // Diving input still pulls the swimmer under.
    wave_speed + spring + desired_z.min(0.0)
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    log::debug!(
        "entity {} swims (relative level {:.2})",
        ctx.host.entity.id(),
        ctx.water.relative_water_level
    );

    ctx.water.set_swimming(true);
    util::phy_set_fly(ctx.params, ctx.host.entity, true);
    ctx.host.swim_cue(SwimCue::EnterWater);

    *ctx.session = Some(Session::Swim(SwimSession {
        on_surface: surfaced(ctx.params, ctx.water.relative_water_level),
        head_was_underwater: ctx.water.head_underwater,
        head_underwater_time: 0.0,
        last_water_level: ctx.water.water_level,
    }));
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    ctx.water.set_swimming(false);
    util::phy_set_no_fly(ctx.params, ctx.host.entity);
    ctx.host.swim_cue(SwimCue::ExitWater);
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { frame_time, movement } => {
            pre_physics(ctx, frame_time, &movement)
        }
        // No jumping off the water; a fast surfacing is a dolphin jump instead.
        MovementEvent::Jump => Transition::Done,
        _ => Transition::Continue,
    }
}

fn pre_physics(ctx: &mut StateCtx, frame_time: f32, movement: &FrameMovementParams) -> Transition {
    let params = ctx.params;
    let position = ctx.host.entity.world_position();
    ctx.water.update(params, position, ctx.host.water, frame_time);

    if !ctx.water.in_water() || ctx.water.should_stop_swimming(params) {
        return if ctx.physics.flags.flying() {
            Transition::To(StateId::GroundFall)
        } else {
            Transition::To(StateId::GroundMovement)
        };
    }

    let relative = ctx.water.relative_water_level;
    let head_underwater = ctx.water.head_underwater;
    let water_level = ctx.water.water_level;
    let current = ctx.physics.velocity;
    let view = ctx.host.entity.view_rotation();

    let Some(session) = session(ctx) else {
        return Transition::Continue;
    };

    if let Some(jump) = dolphin_jump(params, session.on_surface, relative, current.z) {
        log::debug!("dolphin jump at {:.2} m/s", current.z);
        *ctx.pending = Some(PendingEntry::Jump(jump));
        return Transition::To(StateId::Jump);
    }
    session.on_surface = surfaced(params, relative);

    let cues = session.track_head(params, head_underwater, frame_time);

    let wave_speed = match (water_level, session.last_water_level) {
        (Some(now), Some(before)) if frame_time > 0.0 => (now - before) / frame_time,
        _ => 0.0,
    };
    session.last_water_level = water_level;

    let desired = desired_velocity(params, view, movement);
    let blend = (params.swim.acceleration * frame_time).clamp(0.0, 1.0);
    let mut velocity = current.lerp(desired, blend);

    let near_surface = relative > -params.swim.near_surface_depth;
    if near_surface && desired.z <= 0.0 {
        velocity.z = surface_vertical_speed(params, relative, wave_speed, desired.z);
    } else if near_surface
        && velocity.z > 0.0
        && velocity.z < params.swim.dolphin_jump_threshold
    {
        // Slow ascent near the surface so swimmers settle instead of popping out.
        velocity.z *= (1.0 - params.swim.near_surface_damping * frame_time).max(0.0);
    }

    for cue in cues.into_iter().flatten() {
        ctx.host.swim_cue(cue);
    }

    let request = ctx.frame.write();
    request.kind = RequestKind::Fly;
    request.velocity = velocity;
    util::process_turning(request, movement);
    Transition::Continue
}
