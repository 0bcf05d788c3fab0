//! Water proxy kept up to date while the player is near water.
//!
//! The proxy is owned by the state machine rather than by the Swim state:
//! the swim test ancestor refreshes it on every grounded tick so Ground can
//! damp speed in shallow water, and landing uses it to skip fall damage
//! after leaving the water.

use glam::Vec3;

use crate::config::MovementParams;
use crate::host::WaterQuery;

/// Relative water level reported when there is no water around.
pub const DRY: f32 = f32::MAX;

#[derive(Debug, Clone, PartialEq)]
pub struct WaterProxy {
    /// Surface height at the player, `None` outside water.
    pub water_level: Option<f32>,

    /// Ground height below the player from the last probe.
    pub bottom_level: Option<f32>,

    /// Reference height minus water level; negative when submerged.
    pub relative_water_level: f32,

    /// Water depth at the player's position.
    pub relative_bottom_depth: f32,

    pub head_underwater: bool,

    /// Seconds since the Swim state was last active.
    pub time_since_swimming: f32,

    pub swimming: bool,
}

impl Default for WaterProxy {
    fn default() -> Self {
        Self {
            water_level: None,
            bottom_level: None,
            relative_water_level: DRY,
            relative_bottom_depth: 0.0,
            head_underwater: false,
            time_since_swimming: f32::MAX,
            swimming: false,
        }
    }
}

impl WaterProxy {
    /// Probe the world at `position` (the player's feet).
    pub fn update(
        &mut self,
        params: &MovementParams,
        position: Vec3,
        world: &dyn WaterQuery,
        frame_time: f32,
    ) {
        self.water_level = world.water_level(position);
        self.bottom_level = world.ground_level(position);

        match self.water_level {
            Some(water) => {
                self.relative_water_level = position.z + params.swim.reference_height - water;
                let bottom = self.bottom_level.unwrap_or(position.z);
                self.relative_bottom_depth = (water - bottom).max(0.0);
                self.head_underwater = water > position.z + params.body.eye_height;
            }
            None => {
                self.relative_water_level = DRY;
                self.relative_bottom_depth = 0.0;
                self.head_underwater = false;
            }
        }

        if self.swimming {
            self.time_since_swimming = 0.0;
        } else {
            self.time_since_swimming += frame_time;
        }
    }

    /// Whether the water is deep enough to start swimming.
    pub fn should_swim(&self, params: &MovementParams) -> bool {
        self.relative_water_level < params.swim.enter_level
    }

    /// Whether the water got shallow enough to stop swimming.
    pub fn should_stop_swimming(&self, params: &MovementParams) -> bool {
        self.relative_water_level > params.swim.stop_level
    }

    /// Whether the player is in water at all.
    pub fn in_water(&self) -> bool {
        self.water_level.is_some()
    }

    pub fn set_swimming(&mut self, swimming: bool) {
        self.swimming = swimming;
        if swimming {
            self.time_since_swimming = 0.0;
        }
    }
}
