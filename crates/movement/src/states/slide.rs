//! Sliding out of a sprint.

use glam::Vec3;

use crate::config::SlideParams;
use crate::host::{AnimationAction, Stance};
use crate::hsm::{StateId, Transition};
use crate::request::{FrameMovementParams, RequestKind};
use crate::util;

use super::{MovementEvent, Session, StateCtx};

/// Result of one slide step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideStep {
    Sliding,
    Finished,
}

/// Slide kinematics.
///
/// Starts with a boost along the current direction, loses speed to friction
/// and gains it on downhill slopes.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideController {
    /// Horizontal slide velocity.
    pub velocity: Vec3,

    /// Remaining grace time once a lazy exit was requested.
    pub lazy_exit: Option<f32>,

    pub elapsed: f32,
}

impl SlideController {
    pub fn start(params: &SlideParams, initial: Vec3) -> Self {
        let horizontal = Vec3::new(initial.x, initial.y, 0.0);
        let boosted = horizontal + horizontal.normalize_or_zero() * params.boost;
        Self {
            velocity: boosted.clamp_length_max(params.max_speed),
            lazy_exit: None,
            elapsed: 0.0,
        }
    }

    /// Finish within the grace time instead of immediately.
    pub fn request_lazy_exit(&mut self, params: &SlideParams) {
        if self.lazy_exit.is_none() {
            self.lazy_exit = Some(params.lazy_exit_time);
        }
    }

    pub fn update(&mut self, params: &SlideParams, ground_normal: Vec3, dt: f32) -> SlideStep {
        self.elapsed += dt;

        // The horizontal part of the normal points downhill with length sin(slope).
        let downhill = Vec3::new(ground_normal.x, ground_normal.y, 0.0);
        self.velocity += downhill * params.downhill_acceleration * dt;

        let speed = self.velocity.length();
        let slowed = (speed - params.friction * dt).max(0.0);
        self.velocity = (self.velocity.normalize_or_zero() * slowed).clamp_length_max(params.max_speed);

        if let Some(remaining) = self.lazy_exit.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                return SlideStep::Finished;
            }
        }
        if self.velocity.length() < params.exit_speed {
            return SlideStep::Finished;
        }
        SlideStep::Sliding
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SlideSession {
    pub controller: SlideController,
}

fn session<'a>(ctx: &'a mut StateCtx<'_, '_>) -> Option<&'a mut SlideSession> {
    match ctx.session.as_mut() {
        Some(Session::Slide(session)) => Some(session),
        _ => None,
    }
}

/// A slide needs a sprint at speed with ground contact.
pub(super) fn can_start(ctx: &StateCtx) -> bool {
    ctx.stats.is_sprinting
        && ctx.physics.on_ground()
        && ctx.physics.horizontal_velocity().length() >= ctx.params.slide.min_start_speed
}

pub(super) fn enter(ctx: &mut StateCtx) -> Transition {
    let initial = ctx
        .take_pending_airborne()
        .unwrap_or(ctx.physics.velocity);
    let controller = SlideController::start(&ctx.params.slide, initial);
    log::debug!(
        "entity {} slide at {:.2} m/s",
        ctx.host.entity.id(),
        controller.velocity.length()
    );

    ctx.stats.is_sliding = true;
    *ctx.session = Some(Session::Slide(SlideSession { controller }));
    ctx.host.queue_action(AnimationAction::SlideStart);
    Transition::Continue
}

pub(super) fn exit(ctx: &mut StateCtx) {
    ctx.stats.is_sliding = false;
    ctx.host.queue_action(AnimationAction::SlideEnd);
}

pub(super) fn handle(ctx: &mut StateCtx, event: &MovementEvent) -> Transition {
    match *event {
        MovementEvent::PrePhysicsUpdate { frame_time, movement } => {
            pre_physics(ctx, frame_time, &movement)
        }
        MovementEvent::LazyExitSlide => {
            let params = ctx.params;
            if let Some(session) = session(ctx) {
                session.controller.request_lazy_exit(&params.slide);
            }
            Transition::Done
        }
        MovementEvent::StanceChanged(Stance::Stand) => {
            let params = ctx.params;
            if let Some(session) = session(ctx) {
                session.controller.request_lazy_exit(&params.slide);
            }
            Transition::Continue
        }
        MovementEvent::ForceExitSlide => Transition::To(StateId::Ground),
        MovementEvent::Slide => Transition::Done,
        _ => Transition::Continue,
    }
}

fn pre_physics(ctx: &mut StateCtx, frame_time: f32, movement: &FrameMovementParams) -> Transition {
    let params = ctx.params;
    let normal = ctx.physics.ground_normal;
    let Some(session) = session(ctx) else {
        return Transition::Continue;
    };

    if session.controller.update(&params.slide, normal, frame_time) == SlideStep::Finished {
        log::trace!("slide finished after {:.2}s", session.controller.elapsed);
        return Transition::To(StateId::Ground);
    }

    let velocity = session.controller.velocity;
    let velocity = velocity - normal * normal.dot(velocity);

    let request = ctx.frame.write();
    request.kind = RequestKind::Normal;
    request.velocity = velocity;
    util::process_turning(request, movement);
    Transition::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::UP;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn start_boosts_along_direction() {
        let params = SlideParams::default();
        let slide = SlideController::start(&params, Vec3::new(0.0, 6.0, -1.0));
        assert!((slide.velocity - Vec3::new(0.0, 6.0 + params.boost, 0.0)).length() < 1e-5);
    }

    #[test]
    fn friction_ends_slide_on_flat_ground() {
        let params = SlideParams::default();
        let mut slide = SlideController::start(&params, Vec3::new(0.0, 6.0, 0.0));

        let mut ticks = 0;
        while slide.update(&params, UP, DT) == SlideStep::Sliding {
            ticks += 1;
            assert!(ticks < 600, "slide never ended");
        }
        assert!(slide.velocity.length() < params.exit_speed);
    }

    #[test]
    fn downhill_keeps_sliding() {
        let params = SlideParams::default();
        let mut slide = SlideController::start(&params, Vec3::new(0.0, 6.0, 0.0));
        // 30° slope falling away along +Y.
        let normal = Vec3::new(0.0, 0.5, 0.866);
        for _ in 0..300 {
            assert_eq!(slide.update(&params, normal, DT), SlideStep::Sliding);
        }
        assert!(slide.velocity.length() <= params.max_speed + 1e-4);
    }

    #[test]
    fn lazy_exit_finishes_after_grace() {
        let params = SlideParams::default();
        let normal = Vec3::new(0.0, 0.5, 0.866);
        let mut slide = SlideController::start(&params, Vec3::new(0.0, 8.0, 0.0));
        slide.request_lazy_exit(&params);
        // A second request does not extend the grace time.
        slide.update(&params, normal, params.lazy_exit_time * 0.5);
        slide.request_lazy_exit(&params);

        assert_eq!(
            slide.update(&params, normal, params.lazy_exit_time * 0.6),
            SlideStep::Finished
        );
    }
}
