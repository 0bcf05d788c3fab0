//! Per-entity movement statistics read by the states.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::host::Stance;
use crate::physics::{ActorPhysics, UP};
use crate::request::FrameMovementParams;

/// Timers and flags kept across states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementStats {
    /// Seconds of continuous ground contact.
    pub on_ground_time: f32,

    /// Seconds without ground contact.
    pub in_air_time: f32,

    /// Seconds of continuous forward input.
    pub forward_move_time: f32,

    pub is_jumping: bool,
    pub is_sprinting: bool,
    pub is_sliding: bool,

    /// Mirrored from the entity at the start of each pre-physics tick.
    pub stance: Stance,
    pub sprint_stamina: f32,
    pub cinematic_restricted: bool,

    /// Low-pass filtered ground normal used by slope damping.
    pub smoothed_ground_normal: Vec3,
}

impl Default for MovementStats {
    fn default() -> Self {
        Self {
            on_ground_time: 0.0,
            in_air_time: 0.0,
            forward_move_time: 0.0,
            is_jumping: false,
            is_sprinting: false,
            is_sliding: false,
            stance: Stance::Stand,
            sprint_stamina: 1.0,
            cinematic_restricted: false,
            smoothed_ground_normal: UP,
        }
    }
}

impl MovementStats {
    /// Advance the contact timers after a physics resync.
    pub fn advance(&mut self, physics: &ActorPhysics, frame_time: f32) {
        if physics.on_ground() {
            self.on_ground_time += frame_time;
            self.in_air_time = 0.0;
        } else {
            self.in_air_time += frame_time;
            self.on_ground_time = 0.0;
        }
    }

    /// Accumulate forward input time; any other input resets it.
    pub fn track_forward_movement(&mut self, movement: &FrameMovementParams, frame_time: f32) {
        if movement.desired_velocity.y > 0.01 {
            self.forward_move_time += frame_time;
        } else {
            self.forward_move_time = 0.0;
        }
    }

    /// Follow `normal` with an exponential filter of the given rate.
    pub fn smooth_ground_normal(&mut self, normal: Vec3, rate: f32, frame_time: f32) {
        let t = (rate * frame_time).clamp(0.0, 1.0);
        self.smoothed_ground_normal = self
            .smoothed_ground_normal
            .lerp(normal, t)
            .try_normalize()
            .unwrap_or(UP);
    }
}
