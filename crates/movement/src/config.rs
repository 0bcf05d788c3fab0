//! Movement tuning.
//!
//! All parameters are grouped here for easy tuning and are injected into the
//! state machine at construction. Values use metric units (meters, seconds)
//! unless otherwise noted; angles are in degrees.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::{LedgeTransition, Stance};

/// Complete tuning for one player's movement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementParams {
    pub body: BodyParams,
    pub speed: SpeedParams,
    pub ground: GroundParams,
    pub jump: JumpParams,
    pub sprint: SprintParams,
    pub fall_damage: FallDamageParams,
    pub swim: SwimParams,
    pub slide: SlideParams,
    pub ledge: LedgeParams,
    pub ladder: LadderParams,
    pub fly: FlyParams,
    pub spectate: SpectateParams,
    pub dead: DeadParams,
}

// ============================================================================
// Body
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    /// Gravity acceleration (meters/second²).
    pub gravity: f32,

    /// Character-controller inertia on the ground.
    pub inertia: f32,

    /// Character-controller inertia while accelerating.
    pub inertia_accel: f32,

    /// Eye height when standing (meters from feet).
    pub eye_height: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            inertia: 10.0,
            inertia_accel: 11.0,
            eye_height: 1.65,
        }
    }
}

// ============================================================================
// Speeds and environment multipliers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedParams {
    /// Standing max speed (meters/second).
    pub stand_max_speed: f32,

    /// Crouching max speed (meters/second).
    pub crouch_max_speed: f32,

    /// Prone max speed (meters/second).
    pub prone_max_speed: f32,

    /// Speed fraction when moving straight backwards.
    pub backward_multiplier: f32,

    /// Speed fraction when strafing.
    pub strafe_multiplier: f32,

    /// Strafe fraction with a heavy weapon.
    pub strafe_multiplier_heavy: f32,

    /// Penalty for carrying a heavy weapon.
    pub heavy_weapon_multiplier: f32,

    /// Penalty for carrying a game-mode objective.
    pub objective_carry_multiplier: f32,

    pub walk_multiplier: f32,
    pub crouch_multiplier: f32,
    pub sprint_multiplier: f32,

    /// Sprint multiplier while carrying a heavy weapon.
    pub heavy_sprint_multiplier: f32,

    /// Applied last to every ground and jump velocity.
    pub global_multiplier: f32,
}

impl Default for SpeedParams {
    fn default() -> Self {
        Self {
            stand_max_speed: 4.5,
            crouch_max_speed: 2.5,
            prone_max_speed: 1.0,
            backward_multiplier: 0.7,
            strafe_multiplier: 0.9,
            strafe_multiplier_heavy: 0.6,
            heavy_weapon_multiplier: 0.75,
            objective_carry_multiplier: 0.85,
            walk_multiplier: 1.0,
            crouch_multiplier: 1.0,
            sprint_multiplier: 1.6,
            heavy_sprint_multiplier: 1.2,
            global_multiplier: 1.0,
        }
    }
}

impl SpeedParams {
    /// Max speed for a stance.
    pub fn max_speed(&self, stance: Stance) -> f32 {
        match stance {
            Stance::Stand => self.stand_max_speed,
            Stance::Crouch => self.crouch_max_speed,
            Stance::Prone => self.prone_max_speed,
        }
    }
}

// ============================================================================
// Ground
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundParams {
    /// Hard ceiling on ground speed (meters/second).
    pub max_speed: f32,

    /// Slope angle where uphill damping starts (player).
    pub slope_start_angle: f32,

    /// Slope angle where uphill damping is complete (player).
    pub slope_end_angle: f32,

    /// Water depth where shallow water damping starts.
    pub shallow_water_depth_low: f32,

    /// Water depth where shallow water damping is complete.
    pub shallow_water_depth_high: f32,

    /// Speed multiplier at full shallow water damping.
    pub shallow_water_multiplier: f32,

    /// Time without ground contact before a grounded state starts falling.
    pub fall_test_time: f32,

    /// Speed cap while aligning to a melee target.
    pub close_combat_max_speed: f32,

    /// Rate at which the smoothed ground normal follows the real one (1/s).
    pub normal_smoothing: f32,
}

impl Default for GroundParams {
    fn default() -> Self {
        Self {
            max_speed: 22.0,
            slope_start_angle: 10.0,
            slope_end_angle: 50.0,
            shallow_water_depth_low: 0.3,
            shallow_water_depth_high: 1.0,
            shallow_water_multiplier: 0.5,
            fall_test_time: 0.1,
            close_combat_max_speed: 12.0,
            normal_smoothing: 10.0,
        }
    }
}

// ============================================================================
// Jump
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpParams {
    /// Apex height of a standing jump (meters).
    pub height: f32,

    /// Extra apex height when jumping out of a sprint.
    pub sprint_height_bonus: f32,

    /// Ground dwell before a local player may jump again.
    pub min_ground_dwell: f32,

    /// Fraction of ground velocity honoured while airborne.
    pub air_control: f32,
}

impl Default for JumpParams {
    fn default() -> Self {
        Self {
            height: 1.0,
            sprint_height_bonus: 0.2,
            min_ground_dwell: 0.2,
            air_control: 0.3,
        }
    }
}

impl JumpParams {
    /// Launch speed reaching `height` under `gravity`.
    pub fn launch_speed(height: f32, gravity: f32) -> f32 {
        (2.0 * gravity * height.max(0.0)).sqrt()
    }
}

// ============================================================================
// Sprint
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprintParams {
    /// Max angle from straight ahead that still counts as moving forward.
    pub forward_angle: f32,

    /// Forward movement time that counts as moving forward for remote and
    /// AI actors.
    pub remote_forward_time: f32,
}

impl Default for SprintParams {
    fn default() -> Self {
        Self {
            forward_angle: 45.0,
            remote_forward_time: 0.1,
        }
    }
}

// ============================================================================
// Fall damage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallDamageParams {
    /// Impact speed below which landing is free (meters/second).
    pub safe_speed: f32,

    /// Impact speed at or above which landing is fatal.
    pub fatal_speed: f32,

    /// Exponent applied to the linear damage fraction.
    pub curve_exponent: f32,

    /// Non-fatal falls never take health below this.
    pub health_floor: f32,

    /// Landings this soon after swimming are free (seconds).
    pub water_exemption_time: f32,
}

impl Default for FallDamageParams {
    fn default() -> Self {
        Self {
            safe_speed: 11.0,
            fatal_speed: 19.0,
            curve_exponent: 1.5,
            health_floor: 1.0,
            water_exemption_time: 0.5,
        }
    }
}

// ============================================================================
// Swim
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimParams {
    /// Height above the feet the relative water level is measured at.
    pub reference_height: f32,

    /// Start swimming when the relative water level drops below this.
    pub enter_level: f32,

    /// Stop swimming when the relative water level rises above this.
    pub stop_level: f32,

    /// Depth below the surface where the swimmer counts as surfaced.
    pub dolphin_jump_depth: f32,

    /// Upward speed needed to dolphin jump out of the water.
    pub dolphin_jump_threshold: f32,

    /// Vertical speed multiplier for a dolphin jump.
    pub dolphin_jump_modifier: f32,

    /// Base swim speed (meters/second).
    pub speed: f32,

    pub sprint_multiplier: f32,

    /// Multiplier when swimming forward while looking up.
    pub look_up_multiplier: f32,

    /// Blend rate from current to desired velocity (1/s).
    pub acceleration: f32,

    /// Depth band below the surface with extra vertical damping.
    pub near_surface_depth: f32,

    /// Vertical damping rate near the surface (1/s).
    pub near_surface_damping: f32,

    /// Spring rate pulling a surfaced swimmer onto the wave (1/s).
    pub surface_spring: f32,

    /// Relative water level a surfaced swimmer floats at.
    pub surface_float_level: f32,

    /// Head underwater longer than this makes resurfacing gasp for breath.
    pub breath_gasp_time: f32,
}

impl Default for SwimParams {
    fn default() -> Self {
        Self {
            reference_height: 1.3,
            enter_level: -0.15,
            stop_level: 0.35,
            dolphin_jump_depth: 0.1,
            dolphin_jump_threshold: 3.0,
            dolphin_jump_modifier: 1.2,
            speed: 3.0,
            sprint_multiplier: 1.5,
            look_up_multiplier: 1.2,
            acceleration: 4.0,
            near_surface_depth: 0.5,
            near_surface_damping: 5.0,
            surface_spring: 4.0,
            surface_float_level: -0.05,
            breath_gasp_time: 8.0,
        }
    }
}

// ============================================================================
// Slide
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideParams {
    /// Horizontal speed needed to start a slide.
    pub min_start_speed: f32,

    /// Speed added when the slide starts.
    pub boost: f32,

    /// Deceleration on flat ground (meters/second²).
    pub friction: f32,

    /// Acceleration scale on downhill slopes.
    pub downhill_acceleration: f32,

    pub max_speed: f32,

    /// The slide ends below this speed.
    pub exit_speed: f32,

    /// Grace time of a lazy exit.
    pub lazy_exit_time: f32,
}

impl Default for SlideParams {
    fn default() -> Self {
        Self {
            min_start_speed: 5.0,
            boost: 1.5,
            friction: 3.0,
            downhill_acceleration: 6.0,
            max_speed: 12.0,
            exit_speed: 2.0,
            lazy_exit_time: 0.3,
        }
    }
}

// ============================================================================
// Ledge
// ============================================================================

/// When the ground state probes for vaultable ledges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultCheckMode {
    #[default]
    WhileJumpHeld,
    Always,
}

/// Blend parameters of one ledge transition.
///
/// Offsets are in ledge space: x along the ledge, y out of the wall, z up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgeBlend {
    /// Where the player must be, relative to the ledge, for this transition.
    pub anchor_offset: Vec3,

    /// Where the transition leaves the player, relative to the ledge.
    pub end_offset: Vec3,

    /// Time to move from the grab position to the end position.
    pub move_duration: f32,

    /// Full animation length.
    pub anim_duration: f32,

    /// Velocity handed to physics when the transition ends airborne, in
    /// ledge space.
    pub exit_velocity: Vec3,

    /// The transition ends airborne.
    pub end_falling: bool,
}

impl Default for LedgeBlend {
    fn default() -> Self {
        Self {
            anchor_offset: Vec3::new(0.0, 0.6, -1.2),
            end_offset: Vec3::new(0.0, -0.4, 0.0),
            move_duration: 0.6,
            anim_duration: 0.8,
            exit_velocity: Vec3::ZERO,
            end_falling: false,
        }
    }
}

/// Blend table indexed by transition kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgeTransitionTable {
    pub pull_up: LedgeBlend,
    pub quick_grab: LedgeBlend,
    pub vault_over: LedgeBlend,
    pub vault_over_into_fall: LedgeBlend,
    pub vault_onto: LedgeBlend,
    pub high_vault_over: LedgeBlend,
    pub high_vault_onto: LedgeBlend,
}

impl Default for LedgeTransitionTable {
    fn default() -> Self {
        Self {
            pull_up: LedgeBlend::default(),
            quick_grab: LedgeBlend {
                anchor_offset: Vec3::new(0.0, 0.5, -0.6),
                move_duration: 0.35,
                anim_duration: 0.45,
                ..Default::default()
            },
            vault_over: LedgeBlend {
                anchor_offset: Vec3::new(0.0, 1.2, -1.0),
                end_offset: Vec3::new(0.0, -1.0, -1.0),
                move_duration: 0.4,
                anim_duration: 0.5,
                ..Default::default()
            },
            vault_over_into_fall: LedgeBlend {
                anchor_offset: Vec3::new(0.0, 1.2, -1.0),
                end_offset: Vec3::new(0.0, -0.8, 0.1),
                move_duration: 0.35,
                anim_duration: 0.4,
                exit_velocity: Vec3::new(0.0, -4.0, 0.0),
                end_falling: true,
            },
            vault_onto: LedgeBlend {
                anchor_offset: Vec3::new(0.0, 0.5, -1.0),
                end_offset: Vec3::new(0.0, -0.3, 0.0),
                move_duration: 0.35,
                anim_duration: 0.45,
                ..Default::default()
            },
            high_vault_over: LedgeBlend {
                anchor_offset: Vec3::new(0.0, 1.4, -1.6),
                end_offset: Vec3::new(0.0, -1.0, -1.6),
                move_duration: 0.6,
                anim_duration: 0.7,
                exit_velocity: Vec3::new(0.0, -3.5, 0.0),
                ..Default::default()
            },
            high_vault_onto: LedgeBlend {
                anchor_offset: Vec3::new(0.0, 0.6, -1.6),
                end_offset: Vec3::new(0.0, -0.3, 0.0),
                move_duration: 0.55,
                anim_duration: 0.65,
                ..Default::default()
            },
        }
    }
}

impl LedgeTransitionTable {
    pub fn get(&self, transition: LedgeTransition) -> &LedgeBlend {
        match transition {
            LedgeTransition::PullUp => &self.pull_up,
            LedgeTransition::QuickGrab => &self.quick_grab,
            LedgeTransition::VaultOver => &self.vault_over,
            LedgeTransition::VaultOverIntoFall => &self.vault_over_into_fall,
            LedgeTransition::VaultOnto => &self.vault_onto,
            LedgeTransition::HighVaultOver => &self.high_vault_over,
            LedgeTransition::HighVaultOnto => &self.high_vault_onto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgeParams {
    pub enabled: bool,

    /// Search radius around the player's chest.
    pub search_radius: f32,

    /// Max angle between the approach direction and the ledge's inward
    /// direction.
    pub max_approach_angle: f32,

    /// Height above the expected jump apex still reachable by the hands.
    pub clear_height: f32,

    /// Ledges lower than this above the feet are stepped over instead.
    pub min_height: f32,

    /// Height above the jump start reachable by a sprint-jump vault.
    pub vault_reach_height: f32,

    pub vault_check: VaultCheckMode,

    pub transitions: LedgeTransitionTable,
}

impl Default for LedgeParams {
    fn default() -> Self {
        Self {
            enabled: true,
            search_radius: 1.2,
            max_approach_angle: 60.0,
            clear_height: 0.6,
            min_height: 0.4,
            vault_reach_height: 2.0,
            vault_check: VaultCheckMode::WhileJumpHeld,
            transitions: LedgeTransitionTable::default(),
        }
    }
}

// ============================================================================
// Ladder, fly, spectate, dead
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderParams {
    /// Climb speed (meters/second).
    pub climb_speed: f32,

    /// Duration of the controlled dismount at the top.
    pub top_dismount_time: f32,

    /// Push away from the ladder when dropping off it.
    pub drop_push_speed: f32,
}

impl Default for LadderParams {
    fn default() -> Self {
        Self {
            climb_speed: 2.0,
            top_dismount_time: 0.6,
            drop_push_speed: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyParams {
    pub speed: f32,
    pub sprint_multiplier: f32,
}

impl Default for FlyParams {
    fn default() -> Self {
        Self {
            speed: 10.0,
            sprint_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectateParams {
    pub speed: f32,

    /// Fade-in duration from black when spectating starts.
    pub fade_time: f32,
}

impl Default for SpectateParams {
    fn default() -> Self {
        Self {
            speed: 8.0,
            fade_time: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadParams {
    /// Time between death and the corpse swap.
    pub corpse_swap_delay: f32,
}

impl Default for DeadParams {
    fn default() -> Self {
        Self {
            corpse_swap_delay: 5.0,
        }
    }
}

// ============================================================================
// Presets and loading
// ============================================================================

impl MovementParams {
    /// Fast movement with forgiving falls and eager vaulting.
    pub fn arcade() -> Self {
        let mut params = Self::default();
        params.speed.stand_max_speed = 6.0;
        params.speed.crouch_max_speed = 3.0;
        params.speed.sprint_multiplier = 1.8;
        params.jump.height = 1.3;
        params.jump.air_control = 0.6;
        params.fall_damage.safe_speed = 15.0;
        params.fall_damage.fatal_speed = 30.0;
        params.ledge.vault_check = VaultCheckMode::Always;
        params
    }

    /// Slower, heavier movement.
    pub fn tactical() -> Self {
        let mut params = Self::default();
        params.speed.stand_max_speed = 3.5;
        params.speed.crouch_max_speed = 1.8;
        params.speed.prone_max_speed = 0.6;
        params.speed.sprint_multiplier = 1.5;
        params.jump.height = 0.8;
        params.jump.air_control = 0.1;
        params.fall_damage.safe_speed = 9.0;
        params.fall_damage.fatal_speed = 16.0;
        params
    }

    /// Parse tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tuning the movement math cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason })
        }

        if self.body.gravity <= 0.0 {
            return invalid("body.gravity", "must be positive");
        }
        if self.fall_damage.fatal_speed <= self.fall_damage.safe_speed {
            return invalid("fall_damage.fatal_speed", "must be greater than safe_speed");
        }
        if self.fall_damage.curve_exponent <= 0.0 {
            return invalid("fall_damage.curve_exponent", "must be positive");
        }
        if self.ground.shallow_water_depth_high <= self.ground.shallow_water_depth_low {
            return invalid(
                "ground.shallow_water_depth_high",
                "must be greater than shallow_water_depth_low",
            );
        }
        if self.ground.slope_end_angle <= self.ground.slope_start_angle {
            return invalid("ground.slope_end_angle", "must be greater than slope_start_angle");
        }
        if self.ground.max_speed <= 0.0 {
            return invalid("ground.max_speed", "must be positive");
        }
        if self.swim.stop_level <= self.swim.enter_level {
            return invalid("swim.stop_level", "must be greater than enter_level");
        }
        if self.swim.enter_level > -self.swim.dolphin_jump_depth {
            return invalid("swim.enter_level", "must be below the dolphin jump depth");
        }
        if self.slide.exit_speed >= self.slide.min_start_speed {
            return invalid("slide.exit_speed", "must be lower than min_start_speed");
        }
        if !(0.0..=180.0).contains(&self.ledge.max_approach_angle) {
            return invalid("ledge.max_approach_angle", "must be within 0..=180 degrees");
        }
        for transition in LedgeTransition::ALL {
            let blend = self.ledge.transitions.get(transition);
            if blend.anim_duration <= 0.0 || blend.move_duration > blend.anim_duration {
                return invalid(
                    "ledge.transitions",
                    "anim_duration must be positive and cover move_duration",
                );
            }
        }
        Ok(())
    }
}
