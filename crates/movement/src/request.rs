//! Per-tick movement request and the raw frame input it is built from.
//!
//! The [`MovementRequest`] is the output contract of the state machine: it
//! is rewritten by exactly one state every pre-physics tick and committed to
//! the locomotion layer through [`crate::util::finalize_movement_request`].

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// How the physics/animation layer interprets [`MovementRequest::velocity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Desired linear velocity for a living entity under gravity.
    #[default]
    Normal,
    /// Desired velocity with gravity disabled (swimming, ladders, flight).
    Fly,
    /// Velocity is an impulse added on top of the current velocity.
    JumpAccumulate,
}

/// The movement a single state asks for this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementRequest {
    /// Interpretation of `velocity`.
    pub kind: RequestKind,

    /// World-space desired velocity (meters/second).
    pub velocity: Vec3,

    /// Relative rotation to apply to the entity this tick.
    pub rotation: Quat,

    /// Copied from the raw input sample.
    pub allow_strafe: bool,

    /// Copied from the raw input sample.
    pub prediction: bool,
}

impl Default for MovementRequest {
    fn default() -> Self {
        Self::neutral()
    }
}

impl MovementRequest {
    /// A `Normal` request with zero velocity and no rotation.
    pub const fn neutral() -> Self {
        Self {
            kind: RequestKind::Normal,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            allow_strafe: false,
            prediction: false,
        }
    }

    /// Check if the request would leave the entity untouched.
    pub fn is_neutral(&self) -> bool {
        *self == Self::neutral()
    }
}

/// The single request slot for one pre-physics tick.
///
/// States only get `&mut` access to it while the tick is being dispatched,
/// and writing through [`FrameRequest::write`] marks the slot as produced.
#[derive(Debug, Clone, Default)]
pub struct FrameRequest {
    request: MovementRequest,
    written: bool,
}

impl FrameRequest {
    /// Create an empty slot holding a neutral request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current contents.
    pub fn get(&self) -> &MovementRequest {
        &self.request
    }

    /// Borrow the request for writing.
    pub fn write(&mut self) -> &mut MovementRequest {
        self.written = true;
        &mut self.request
    }

    /// Whether any state wrote the slot since the last discard.
    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Drop whatever was written and go back to neutral.
    pub fn discard(&mut self) {
        self.request = MovementRequest::neutral();
        self.written = false;
    }

    /// Borrow the request for the finalize step.
    pub(crate) fn request_mut(&mut self) -> &mut MovementRequest {
        &mut self.request
    }
}

/// Raw movement sample for one frame, resolved upstream from the action map.
///
/// `desired_velocity` is in view space: x = strafe right, y = forward,
/// z = up (only used by swimming and flight). Human input is in the unit
/// range; AI may exceed it when it supplies a `sprint` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMovementParams {
    /// Desired velocity in view space.
    pub desired_velocity: Vec3,

    /// Requested rotation this frame in radians: (pitch, roll, yaw).
    pub delta_angles: Vec3,

    /// Jump button held.
    pub jump: bool,

    /// Sprint button held (human players).
    pub sprint_pressed: bool,

    /// Explicit sprint value supplied by AI; zero for humans.
    pub sprint: f32,

    /// Pass-through to the request.
    pub allow_strafe: bool,

    /// Pass-through to the request.
    pub prediction: bool,
}

impl FrameMovementParams {
    /// Movement that only walks in the given view-space direction.
    pub fn walking(strafe: f32, forward: f32) -> Self {
        Self {
            desired_velocity: Vec3::new(strafe, forward, 0.0),
            ..Default::default()
        }
    }

    /// Whether any kind of sprint was requested.
    #[inline]
    pub fn wants_sprint(&self) -> bool {
        self.sprint_pressed || self.sprint > 0.0
    }

    /// Whether the planar input is non-trivial.
    #[inline]
    pub fn has_movement_input(&self) -> bool {
        self.desired_velocity.x.abs() > 0.01 || self.desired_velocity.y.abs() > 0.01
    }
}
