//! Kinematic player body.
//!
//! Stands in for a character controller: no walls, only floors. Velocity is
//! integrated with the gravity last pushed by the movement core, and
//! landing clips the vertical speed the way a solver would.

use glam::{Quat, Vec3};
use strider_movement::{
    Controller, EntityId, FallDamage, ItemStatus, LivingStatus, MovementRequest, PhysicsParams,
    PlayerEntity, RequestKind, Stance, UP,
};

use crate::level::Level;

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: EntityId,
    pub position: Vec3,

    /// Body yaw.
    pub rotation: Quat,

    /// Camera pitch in radians, positive looks up.
    pub view_pitch: f32,

    pub velocity: Vec3,
    pub stance: Stance,
    pub controller: Controller,
    pub item: Option<ItemStatus>,
    pub health: f32,
    pub max_health: f32,
    pub sprint_stamina: f32,

    /// Last parameters pushed by the movement core.
    pub physics: PhysicsParams,

    pub status: LivingStatus,

    // Bookkeeping for the scenario log and tests.
    pub damage_log: Vec<FallDamage>,
    pub stood_on_log: Vec<(Option<EntityId>, Option<EntityId>)>,
    pub corpse: bool,
}

impl Actor {
    pub fn new(id: EntityId, position: Vec3) -> Self {
        let status = LivingStatus::default();
        Self {
            id,
            position,
            rotation: Quat::IDENTITY,
            view_pitch: 0.0,
            velocity: Vec3::ZERO,
            stance: Stance::Stand,
            controller: Controller::Local,
            item: Some(ItemStatus::default()),
            health: 100.0,
            max_health: 100.0,
            sprint_stamina: 1.0,
            physics: PhysicsParams {
                gravity: status.gravity,
                air_control: 1.0,
                inertia: 0.0,
                inertia_accel: 0.0,
                swimming: false,
            },
            status,
            damage_log: Vec::new(),
            stood_on_log: Vec::new(),
            corpse: false,
        }
    }

    pub fn on_ground(&self) -> bool {
        !self.status.flying
    }

    /// Integrate one physics step.
    ///
    /// `None` means no state produced a request this tick; the body keeps
    /// its horizontal speed and falls under whatever gravity is set.
    pub fn step(&mut self, request: Option<&MovementRequest>, level: &Level, dt: f32) {
        let gravity = self.physics.gravity;
        let mut velocity = self.velocity;

        match request {
            Some(request) => match request.kind {
                RequestKind::Fly => velocity = request.velocity,
                RequestKind::JumpAccumulate => velocity += request.velocity + gravity * dt,
                RequestKind::Normal => {
                    velocity.x = request.velocity.x;
                    velocity.y = request.velocity.y;
                    velocity += gravity * dt;
                }
            },
            None => velocity += gravity * dt,
        }
        if let Some(request) = request {
            self.rotation = (self.rotation * request.rotation).normalize();
        }

        self.position += velocity * dt;
        let unconstrained = velocity;

        let (support, collider) = level.support(self.position);
        let grounded = self.position.z <= support;
        if grounded {
            self.position.z = support;
            velocity.z = velocity.z.max(0.0);
        }
        self.velocity = velocity;

        self.status = LivingStatus {
            velocity,
            velocity_unconstrained: unconstrained,
            ground_normal: UP,
            ground_material: None,
            ground_collider: if grounded { collider } else { None },
            flying: !grounded,
            stuck: false,
            gravity,
            mass: self.status.mass,
            angular_velocity: Vec3::ZERO,
        };
    }
}

impl PlayerEntity for Actor {
    fn id(&self) -> EntityId {
        self.id
    }

    fn world_position(&self) -> Vec3 {
        self.position
    }

    fn world_rotation(&self) -> Quat {
        self.rotation
    }

    fn view_rotation(&self) -> Quat {
        self.rotation * Quat::from_rotation_x(self.view_pitch)
    }

    fn living_status(&self) -> Option<LivingStatus> {
        Some(self.status)
    }

    fn set_physics_params(&mut self, params: &PhysicsParams) {
        self.physics = *params;
    }

    fn controller(&self) -> Controller {
        self.controller
    }

    fn stance(&self) -> Stance {
        self.stance
    }

    fn current_item(&self) -> Option<ItemStatus> {
        self.item
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn max_health(&self) -> f32 {
        self.max_health
    }

    fn apply_damage(&mut self, damage: &FallDamage) {
        self.health = (self.health - damage.amount).max(0.0);
        self.damage_log.push(*damage);
    }

    fn sprint_stamina(&self) -> f32 {
        self.sprint_stamina
    }

    fn notify_stood_on_change(&mut self, previous: Option<EntityId>, current: Option<EntityId>) {
        self.stood_on_log.push((previous, current));
    }

    fn swap_to_corpse(&mut self) {
        self.corpse = true;
    }
}
