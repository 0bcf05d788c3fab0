//! Collaborator surface the movement core consumes.
//!
//! The state machine never owns the entity, the animation layer or the world.
//! Everything it needs is reached through the traits here, bundled into a
//! [`Host`] for the duration of one call. Optional collaborators are
//! `Option`s: when one is missing the affected step is skipped.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::physics::{EntityId, LivingStatus, PhysicsParams};
use crate::request::MovementRequest;

/// Who drives the entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Controller {
    /// Locally controlled player.
    #[default]
    Local,
    /// Networked actor simulated from authoritative state.
    Remote,
    /// AI-driven actor.
    Ai,
}

impl Controller {
    #[inline]
    pub fn is_remote(self) -> bool {
        self == Controller::Remote
    }
}

/// Player stance as reported by the stance system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Stand,
    Crouch,
    Prone,
}

/// Sprint-relevant status of the current item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatus {
    /// Heavy weapon (mounted gun, carried turret).
    pub heavy: bool,

    /// Weapon is zoomed or aiming down sights.
    pub zoomed: bool,

    /// The item allows sprinting at all.
    pub can_sprint: bool,
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self {
            heavy: false,
            zoomed: false,
            can_sprint: true,
        }
    }
}

impl ItemStatus {
    /// Whether this item vetoes sprinting.
    #[inline]
    pub fn vetoes_sprint(&self) -> bool {
        !self.can_sprint || self.zoomed
    }
}

/// Damage produced by a hard landing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallDamage {
    /// Health to remove.
    pub amount: f32,

    /// Downward impact speed used for the lookup (meters/second).
    pub impact_speed: f32,

    /// Height between fall start and landing (meters).
    pub fall_height: f32,

    /// Impact speed reached the fatal threshold.
    pub fatal: bool,
}

/// Who drives the entity's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMethod {
    /// Movement requests drive the entity.
    Entity,
    /// Animation drives the entity (ledge grabs, intros).
    Animation,
}

// ============================================================================
// Ledges and ladders
// ============================================================================

/// Identifier of an authored ledge.
pub type LedgeId = u32;

/// Authoring flags on a ledge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgeFlags(pub u8);

impl LedgeFlags {
    /// Low obstacle that can be vaulted.
    pub const VAULT: u8 = 1 << 0;

    /// Tall obstacle that needs a high vault.
    pub const HIGH_VAULT: u8 = 1 << 1;

    /// Landing side is a drop, the transition ends airborne.
    pub const ENDS_IN_AIR: u8 = 1 << 2;

    /// The ledge can be grabbed from both sides.
    pub const DOUBLE_SIDED: u8 = 1 << 3;

    #[inline]
    pub fn has(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    #[inline]
    pub fn with(self, flag: u8) -> Self {
        Self(self.0 | flag)
    }
}

/// Current placement of a ledge. Moving ledges report a new position
/// every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgeInfo {
    pub position: Vec3,

    /// Horizontal unit vector pointing out of the wall the ledge belongs to.
    pub facing: Vec3,

    pub flags: LedgeFlags,
}

/// Authored ledge transition kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgeTransition {
    PullUp,
    QuickGrab,
    VaultOver,
    VaultOverIntoFall,
    VaultOnto,
    HighVaultOver,
    HighVaultOnto,
}

impl LedgeTransition {
    pub const ALL: [LedgeTransition; 7] = [
        LedgeTransition::PullUp,
        LedgeTransition::QuickGrab,
        LedgeTransition::VaultOver,
        LedgeTransition::VaultOverIntoFall,
        LedgeTransition::VaultOnto,
        LedgeTransition::HighVaultOver,
        LedgeTransition::HighVaultOnto,
    ];

    /// Transitions applicable to a ledge with the given flags.
    pub fn candidates(flags: LedgeFlags) -> &'static [LedgeTransition] {
        let ends_in_air = flags.has(LedgeFlags::ENDS_IN_AIR);
        if flags.has(LedgeFlags::HIGH_VAULT) {
            &[LedgeTransition::HighVaultOver, LedgeTransition::HighVaultOnto]
        } else if flags.has(LedgeFlags::VAULT) && ends_in_air {
            &[LedgeTransition::VaultOverIntoFall, LedgeTransition::VaultOnto]
        } else if flags.has(LedgeFlags::VAULT) {
            &[LedgeTransition::VaultOver, LedgeTransition::VaultOnto]
        } else {
            &[LedgeTransition::PullUp, LedgeTransition::QuickGrab]
        }
    }
}

/// Ladder placement handed over with a mount request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LadderMount {
    /// Foot of the ladder.
    pub bottom: Vec3,

    /// Climbable height (meters).
    pub height: f32,

    /// Horizontal unit vector pointing out of the ladder towards the climber.
    pub facing: Vec3,
}

/// How a ladder is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LadderExit {
    /// Controlled dismount at the top.
    Top,
    /// Controlled dismount at the bottom.
    Bottom,
    /// Let go mid-climb.
    Drop,
}

// ============================================================================
// Animation and feedback
// ============================================================================

/// Actions queued into the animation action controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationAction {
    LedgeGrab {
        transition: LedgeTransition,
        duration: f32,
    },
    LadderEnter,
    LadderExit(LadderExit),
    SlideStart,
    SlideEnd,
    Intro,
}

/// Audio and breath cues produced by swimming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwimCue {
    EnterWater,
    ExitWater,
    HeadUnderwater,
    HeadAboveWater { underwater_time: f32 },
    GaspForBreath,
}

// ============================================================================
// Traits
// ============================================================================

/// The entity and physics query surface.
pub trait PlayerEntity {
    fn id(&self) -> EntityId;

    fn world_position(&self) -> Vec3;

    fn world_rotation(&self) -> Quat;

    /// Rotation the movement basis is built from.
    ///
    /// This is the rotation before this tick's turning is applied.
    fn base_rotation(&self) -> Quat {
        self.world_rotation()
    }

    /// Camera rotation including pitch.
    fn view_rotation(&self) -> Quat;

    /// Living status of the physics body, `None` while there is no body.
    fn living_status(&self) -> Option<LivingStatus>;

    fn set_physics_params(&mut self, params: &PhysicsParams);

    fn controller(&self) -> Controller;

    fn stance(&self) -> Stance;

    fn current_item(&self) -> Option<ItemStatus>;

    fn health(&self) -> f32;

    fn max_health(&self) -> f32;

    fn apply_damage(&mut self, damage: &FallDamage);

    /// Carrying a game-mode objective (slows the carrier).
    fn carrying_objective(&self) -> bool {
        false
    }

    /// Position of the melee target the player is aligning to.
    fn close_combat_target(&self) -> Option<Vec3> {
        None
    }

    /// Locked by a cinematic.
    fn cinematic_restricted(&self) -> bool {
        false
    }

    /// Remaining sprint stamina in `[0, 1]`.
    fn sprint_stamina(&self) -> f32 {
        1.0
    }

    /// The entity the player stands on changed.
    fn notify_stood_on_change(&mut self, _previous: Option<EntityId>, _current: Option<EntityId>) {}

    /// Replace the ragdoll with a corpse representation.
    fn swap_to_corpse(&mut self) {}
}

/// The animation action controller.
pub trait AnimationController {
    /// Commit this tick's movement request to the locomotion layer.
    fn add_movement(&mut self, request: &MovementRequest);

    fn queue_action(&mut self, action: AnimationAction);

    fn set_movement_control_method(&mut self, method: ControlMethod);
}

/// World ledge lookup.
pub trait LedgeQuery {
    /// Nearest grabbable ledge within `radius` of `position`.
    fn find_nearest_ledge(&self, position: Vec3, radius: f32) -> Option<LedgeId>;

    fn ledge(&self, id: LedgeId) -> Option<LedgeInfo>;
}

/// World water and ground height lookup.
pub trait WaterQuery {
    /// Water surface height at `position`, `None` outside water volumes.
    fn water_level(&self, position: Vec3) -> Option<f32>;

    /// Ground height below `position`.
    fn ground_level(&self, position: Vec3) -> Option<f32>;
}

/// Audio, breath and screen effects.
pub trait MovementFeedback {
    fn swim_cue(&mut self, _cue: SwimCue) {}

    /// Screen fade overlay alpha, 0 = clear, 1 = black.
    fn screen_fade(&mut self, _alpha: f32) {}
}

/// A world without ledges or water.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyWorld;

impl LedgeQuery for EmptyWorld {
    fn find_nearest_ledge(&self, _position: Vec3, _radius: f32) -> Option<LedgeId> {
        None
    }

    fn ledge(&self, _id: LedgeId) -> Option<LedgeInfo> {
        None
    }
}

impl WaterQuery for EmptyWorld {
    fn water_level(&self, _position: Vec3) -> Option<f32> {
        None
    }

    fn ground_level(&self, _position: Vec3) -> Option<f32> {
        None
    }
}

/// Collaborators lent to the state machine for one call.
pub struct Host<'a> {
    pub entity: &'a mut dyn PlayerEntity,
    pub animation: Option<&'a mut dyn AnimationController>,
    pub ledges: &'a dyn LedgeQuery,
    pub water: &'a dyn WaterQuery,
    pub feedback: Option<&'a mut dyn MovementFeedback>,
}

impl<'a> Host<'a> {
    /// Host with only an entity, no animation and an empty world.
    pub fn bare(entity: &'a mut dyn PlayerEntity) -> Self {
        Self {
            entity,
            animation: None,
            ledges: &EmptyWorld,
            water: &EmptyWorld,
            feedback: None,
        }
    }

    /// Queue an animation action. Returns false without an animation layer.
    pub fn queue_action(&mut self, action: AnimationAction) -> bool {
        match self.animation.as_deref_mut() {
            Some(animation) => {
                animation.queue_action(action);
                true
            }
            None => false,
        }
    }

    pub fn set_control_method(&mut self, method: ControlMethod) {
        if let Some(animation) = self.animation.as_deref_mut() {
            animation.set_movement_control_method(method);
        }
    }

    pub fn swim_cue(&mut self, cue: SwimCue) {
        if let Some(feedback) = self.feedback.as_deref_mut() {
            feedback.swim_cue(cue);
        }
    }

    pub fn screen_fade(&mut self, alpha: f32) {
        if let Some(feedback) = self.feedback.as_deref_mut() {
            feedback.screen_fade(alpha);
        }
    }
}
