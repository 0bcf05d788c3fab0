//! Strider Sandbox
//!
//! A headless host for the movement core: a blockout [`Level`], a kinematic
//! [`Actor`] body and recording animation and feedback layers, stepped by a
//! fixed-rate [`Simulation`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Simulation                           │
//! │  ┌─────────┐   ┌──────────────┐   ┌─────────┐   ┌─────────┐  │
//! │  │ Events  │──►│ Pre-physics  │──►│ Actor   │──►│ Resync  │  │
//! │  │         │   │ (movement    │   │ step    │   │ + update│  │
//! │  └─────────┘   │  request)    │   └─────────┘   └─────────┘  │
//! │                └──────────────┘                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod actor;
pub mod level;
pub mod recorder;
pub mod simulation;

// Re-export main types
pub use actor::Actor;
pub use level::Level;
pub use recorder::{RecordingAnimation, RecordingFeedback};
pub use simulation::{Simulation, SimulationConfig, TickReport};
