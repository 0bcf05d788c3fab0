//! In-crate test doubles for the host traits.

use glam::{Quat, Vec3};

use crate::host::{
    AnimationAction, AnimationController, ControlMethod, Controller, FallDamage, ItemStatus,
    LedgeId, LedgeInfo, LedgeQuery, MovementFeedback, PlayerEntity, Stance, SwimCue, WaterQuery,
};
use crate::physics::{EntityId, LivingStatus, PhysicsParams};
use crate::request::MovementRequest;

pub(crate) struct TestEntity {
    pub position: Vec3,
    pub rotation: Quat,
    pub view_pitch: f32,
    pub stance: Stance,
    pub controller: Controller,
    pub item: Option<ItemStatus>,
    pub status: Option<LivingStatus>,
    pub health: f32,
    pub max_health: f32,
    pub close_combat_target: Option<Vec3>,
    pub physics_params: Option<PhysicsParams>,
    pub damage: Vec<FallDamage>,
    pub stood_on_changes: Vec<(Option<EntityId>, Option<EntityId>)>,
    pub corpse_swaps: u32,
}

impl Default for TestEntity {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            view_pitch: 0.0,
            stance: Stance::Stand,
            controller: Controller::Local,
            item: None,
            status: Some(LivingStatus::default()),
            health: 100.0,
            max_health: 100.0,
            close_combat_target: None,
            physics_params: None,
            damage: Vec::new(),
            stood_on_changes: Vec::new(),
            corpse_swaps: 0,
        }
    }
}

impl TestEntity {
    pub fn damage_taken(&self) -> f32 {
        self.damage.iter().map(|damage| damage.amount).sum()
    }

    /// Report a living status as if physics ran.
    pub fn set_status(&mut self, velocity: Vec3, flying: bool) {
        self.status = Some(LivingStatus {
            velocity,
            velocity_unconstrained: velocity,
            flying,
            ..Default::default()
        });
    }
}

impl PlayerEntity for TestEntity {
    fn id(&self) -> EntityId {
        1
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
        self.status
    }

    fn set_physics_params(&mut self, params: &PhysicsParams) {
        self.physics_params = Some(*params);
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
        self.damage.push(*damage);
    }

    fn close_combat_target(&self) -> Option<Vec3> {
        self.close_combat_target
    }

    fn notify_stood_on_change(&mut self, previous: Option<EntityId>, current: Option<EntityId>) {
        self.stood_on_changes.push((previous, current));
    }

    fn swap_to_corpse(&mut self) {
        self.corpse_swaps += 1;
    }
}

#[derive(Default)]
pub(crate) struct TestAnimation {
    pub movements: Vec<MovementRequest>,
    pub actions: Vec<AnimationAction>,
    pub control_methods: Vec<ControlMethod>,
}

impl AnimationController for TestAnimation {
    fn add_movement(&mut self, request: &MovementRequest) {
        self.movements.push(*request);
    }

    fn queue_action(&mut self, action: AnimationAction) {
        self.actions.push(action);
    }

    fn set_movement_control_method(&mut self, method: ControlMethod) {
        self.control_methods.push(method);
    }
}

#[derive(Default)]
pub(crate) struct TestFeedback {
    pub cues: Vec<SwimCue>,
    pub fades: Vec<f32>,
}

impl MovementFeedback for TestFeedback {
    fn swim_cue(&mut self, cue: SwimCue) {
        self.cues.push(cue);
    }

    fn screen_fade(&mut self, alpha: f32) {
        self.fades.push(alpha);
    }
}

/// Flat world with optional water everywhere and a list of ledges.
#[derive(Default)]
pub(crate) struct TestWorld {
    pub ledges: Vec<LedgeInfo>,
    pub water_level: Option<f32>,
    pub ground_level: Option<f32>,
}

impl TestWorld {
    /// Add a ledge; its id is its index.
    pub fn add_ledge(&mut self, info: LedgeInfo) -> LedgeId {
        self.ledges.push(info);
        (self.ledges.len() - 1) as LedgeId
    }

    pub fn set_ledge_position(&mut self, id: LedgeId, position: Vec3) {
        if let Some(ledge) = self.ledges.get_mut(id as usize) {
            ledge.position = position;
        }
    }
}

impl LedgeQuery for TestWorld {
    fn find_nearest_ledge(&self, position: Vec3, radius: f32) -> Option<LedgeId> {
        self.ledges
            .iter()
            .enumerate()
            .map(|(id, ledge)| (id, ledge.position.distance(position)))
            .filter(|&(_, distance)| distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id as LedgeId)
    }

    fn ledge(&self, id: LedgeId) -> Option<LedgeInfo> {
        self.ledges.get(id as usize).copied()
    }
}

impl WaterQuery for TestWorld {
    fn water_level(&self, _position: Vec3) -> Option<f32> {
        self.water_level
    }

    fn ground_level(&self, _position: Vec3) -> Option<f32> {
        self.ground_level
    }
}
