//! Fixed-step frame loop around one player's movement.
//!
//! Each tick runs the host side of the contract in order: gameplay events,
//! pre-physics, the physics step, the physics resync, then the
//! post-physics update.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use strider_movement::{
    FrameMovementParams, Host, MovementEvent, MovementParams, MovementRequest, PersistError,
    PlayerMovement, StateId,
};

use crate::actor::Actor;
use crate::level::Level;
use crate::recorder::{RecordingAnimation, RecordingFeedback};

/// Horizontal distance from a ladder's foot that still mounts it.
pub const LADDER_MOUNT_RADIUS: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    pub movement: MovementParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            movement: MovementParams::default(),
        }
    }
}

impl SimulationConfig {
    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

/// What one tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub request: Option<MovementRequest>,
    pub state: StateId,
}

pub struct Simulation {
    /// Current frame number, also used as the physics resync id.
    pub frame: u64,
    pub config: SimulationConfig,
    pub level: Level,
    pub actor: Actor,
    pub animation: RecordingAnimation,
    pub feedback: RecordingFeedback,
    pub movement: PlayerMovement,
}

impl Simulation {
    pub fn new(config: SimulationConfig, level: Level, spawn: Vec3) -> Self {
        let movement = PlayerMovement::new(Arc::new(config.movement.clone()));
        Self {
            frame: 0,
            config,
            level,
            actor: Actor::new(1, spawn),
            animation: RecordingAnimation::default(),
            feedback: RecordingFeedback::default(),
            movement,
        }
    }

    /// Default configuration on the test course, spawned at the origin.
    pub fn test() -> Self {
        Self::new(SimulationConfig::default(), Level::test_course(), Vec3::ZERO)
    }

    pub fn state(&self) -> StateId {
        self.movement.active_state()
    }

    /// Ladder mount event if the actor stands at the foot of a ladder.
    pub fn ladder_event(&self) -> Option<MovementEvent> {
        self.level
            .ladder_near(self.actor.position, LADDER_MOUNT_RADIUS)
            .map(MovementEvent::Ladder)
    }

    /// Advance one tick.
    pub fn tick(&mut self, input: &FrameMovementParams, events: &[MovementEvent]) -> TickReport {
        let dt = self.config.delta_time();
        let before = self.movement.active_state();

        let request = {
            let mut host = Host {
                entity: &mut self.actor,
                animation: Some(&mut self.animation),
                ledges: &self.level,
                water: &self.level,
                feedback: Some(&mut self.feedback),
            };
            for event in events {
                self.movement.handle_event(&mut host, event);
            }
            self.movement.pre_physics_update(&mut host, dt, input)
        };

        self.actor.step(request.as_ref(), &self.level, dt);
        self.frame += 1;

        {
            let mut host = Host {
                entity: &mut self.actor,
                animation: Some(&mut self.animation),
                ledges: &self.level,
                water: &self.level,
                feedback: Some(&mut self.feedback),
            };
            self.movement.update_physics_stats(&mut host, self.frame);
            self.movement.update(&mut host, dt);
        }

        let state = self.movement.active_state();
        if state != before {
            log::info!(
                "frame {}: {:?} -> {:?} at ({:.2}, {:.2}, {:.2})",
                self.frame,
                before,
                state,
                self.actor.position.x,
                self.actor.position.y,
                self.actor.position.z
            );
        }
        TickReport { request, state }
    }

    /// Run `ticks` ticks with the same input and no events.
    pub fn run(&mut self, input: &FrameMovementParams, ticks: usize) -> TickReport {
        let mut report = TickReport {
            request: None,
            state: self.state(),
        };
        for _ in 0..ticks {
            report = self.tick(input, &[]);
        }
        report
    }

    /// Run until `done` holds or `limit` ticks passed. Returns the ticks run
    /// when `done` was reached.
    pub fn run_until(
        &mut self,
        input: &FrameMovementParams,
        limit: usize,
        mut done: impl FnMut(&Simulation) -> bool,
    ) -> Option<usize> {
        for tick in 1..=limit {
            self.tick(input, &[]);
            if done(self) {
                return Some(tick);
            }
        }
        None
    }

    pub fn save(&self) -> Result<Vec<u8>, PersistError> {
        self.movement.serialize_state()
    }

    pub fn load(&mut self, bytes: &[u8]) -> Result<(), PersistError> {
        let mut host = Host {
            entity: &mut self.actor,
            animation: Some(&mut self.animation),
            ledges: &self.level,
            water: &self.level,
            feedback: Some(&mut self.feedback),
        };
        self.movement.deserialize_state(&mut host, bytes)
    }
}
