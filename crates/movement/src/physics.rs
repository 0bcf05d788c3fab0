//! Actor physics snapshot shared read-only with every movement state.
//!
//! The snapshot is refreshed once per frame from the host's living-entity
//! status by [`crate::util::update_player_physics_stats`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World up axis. Movement math is Z-up.
pub const UP: Vec3 = Vec3::Z;

/// Identifier of an entity in the host world.
pub type EntityId = u32;

/// Flags describing the actor's physical contact state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsFlags(pub u8);

impl PhysicsFlags {
    /// No ground contact this frame.
    pub const FLYING: u8 = 1 << 0;

    /// No ground contact last frame.
    pub const WAS_FLYING: u8 = 1 << 1;

    /// Physics reported the actor as stuck in geometry.
    pub const STUCK: u8 = 1 << 2;

    /// Check if a flag is set.
    #[inline]
    pub fn has(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Set or clear a flag.
    #[inline]
    pub fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    #[inline]
    pub fn flying(self) -> bool {
        self.has(Self::FLYING)
    }

    #[inline]
    pub fn was_flying(self) -> bool {
        self.has(Self::WAS_FLYING)
    }

    #[inline]
    pub fn stuck(self) -> bool {
        self.has(Self::STUCK)
    }
}

/// Living-entity status as reported by the physics engine after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivingStatus {
    /// Collision-resolved velocity.
    pub velocity: Vec3,

    /// Velocity before collision constraints were applied.
    pub velocity_unconstrained: Vec3,

    /// Normal of the surface below the actor (UP when airborne).
    pub ground_normal: Vec3,

    /// Surface material index of the ground, if any.
    pub ground_material: Option<u16>,

    /// Entity the actor is standing on, if any.
    pub ground_collider: Option<EntityId>,

    /// No ground contact.
    pub flying: bool,

    /// Stuck in geometry.
    pub stuck: bool,

    /// Gravity acting on the actor.
    pub gravity: Vec3,

    /// Mass of the living body (kg).
    pub mass: f32,

    /// Angular velocity (radians/second).
    pub angular_velocity: Vec3,
}

impl Default for LivingStatus {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            velocity_unconstrained: Vec3::ZERO,
            ground_normal: UP,
            ground_material: None,
            ground_collider: None,
            flying: false,
            stuck: false,
            gravity: Vec3::new(0.0, 0.0, -9.81),
            mass: 80.0,
            angular_velocity: Vec3::ZERO,
        }
    }
}

/// Per-entity physics snapshot, refreshed once per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorPhysics {
    pub velocity: Vec3,
    pub velocity_unconstrained: Vec3,

    /// Unconstrained velocity of the previous frame.
    ///
    /// Landing clips the current frame's velocity, so impact speed is read
    /// from here.
    pub velocity_unconstrained_last: Vec3,

    pub ground_normal: Vec3,
    pub ground_material: Option<u16>,
    pub ground_collider: Option<EntityId>,
    pub flags: PhysicsFlags,
    pub gravity: Vec3,
    pub mass: f32,
    pub angular_velocity: Vec3,

    /// Frame id of the last resync, used to make the resync idempotent.
    pub last_frame_update: Option<u64>,
}

impl Default for ActorPhysics {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            velocity_unconstrained: Vec3::ZERO,
            velocity_unconstrained_last: Vec3::ZERO,
            ground_normal: UP,
            ground_material: None,
            ground_collider: None,
            flags: PhysicsFlags::default(),
            gravity: Vec3::new(0.0, 0.0, -9.81),
            mass: 80.0,
            angular_velocity: Vec3::ZERO,
            last_frame_update: None,
        }
    }
}

impl ActorPhysics {
    /// Horizontal part of the current velocity.
    pub fn horizontal_velocity(&self) -> Vec3 {
        Vec3::new(self.velocity.x, self.velocity.y, 0.0)
    }

    /// Whether the actor has ground contact.
    #[inline]
    pub fn on_ground(&self) -> bool {
        !self.flags.flying()
    }
}

/// Parameters pushed to the living entity when a state changes how it is
/// simulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    /// Gravity applied to the living body.
    pub gravity: Vec3,

    /// Fraction of requested velocity honoured while airborne.
    pub air_control: f32,

    /// Character-controller inertia; zero makes velocity changes immediate.
    pub inertia: f32,

    /// Inertia used while accelerating.
    pub inertia_accel: f32,

    /// The body is swimming (buoyancy and water drag on the host side).
    pub swimming: bool,
}
